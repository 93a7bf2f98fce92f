// SPDX-License-Identifier: AGPL-3.0-or-later

//! [`StoreIntrospector`] backed by `information_schema` and `pg_indexes`
//! queries, used to infer pipeline progress when no state file is present.

use catcache_repo::error::Result as RepoResult;
use catcache_repo::introspect::StoreIntrospector;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Text};

use crate::prelude::{repo_error, Connection};

#[derive(QueryableByName)]
struct BoolRow {
    #[diesel(sql_type = Bool)]
    value: bool,
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

impl StoreIntrospector for Connection<'_> {
    fn table_exists(&mut self, table: &str) -> RepoResult<bool> {
        diesel::sql_query(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            ) AS value",
        )
        .bind::<Text, _>(table)
        .get_result::<BoolRow>(self.as_mut())
        .map(|row| row.value)
        .map_err(repo_error)
    }

    fn table_has_rows(&mut self, table: &str) -> RepoResult<bool> {
        if !self.table_exists(table)? {
            return Ok(false);
        }
        // `table` only ever comes from hard-coded call sites in this crate,
        // never from user input, so interpolating it is safe here.
        let sql = format!("SELECT count(*) AS count FROM {table} LIMIT 1");
        diesel::sql_query(sql).get_result::<CountRow>(self.as_mut()).map(|row| row.count > 0).map_err(repo_error)
    }

    fn column_exists(&mut self, table: &str, column: &str) -> RepoResult<bool> {
        diesel::sql_query(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_schema = 'public' AND table_name = $1 AND column_name = $2
            ) AS value",
        )
        .bind::<Text, _>(table)
        .bind::<Text, _>(column)
        .get_result::<BoolRow>(self.as_mut())
        .map(|row| row.value)
        .map_err(repo_error)
    }

    fn indexes_exist(&mut self, names: &[&str]) -> RepoResult<bool> {
        for &name in names {
            let exists = diesel::sql_query(
                "SELECT EXISTS (
                    SELECT 1 FROM pg_indexes WHERE schemaname = 'public' AND indexname = $1
                ) AS value",
            )
            .bind::<Text, _>(name)
            .get_result::<BoolRow>(self.as_mut())
            .map(|row| row.value)
            .map_err(repo_error)?;
            if !exists {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use catcache_repo::introspect::StoreIntrospector as _;

    use crate::prelude::tests::establish_connection;
    use crate::prelude::Connection;

    #[test]
    #[ignore = "requires TEST_DATABASE_URL"]
    fn table_exists_reflects_migrated_schema() {
        let mut conn = establish_connection().expect("connection");
        let mut connection = Connection::new(&mut conn);
        assert!(connection.table_exists("release").expect("introspect"));
        assert!(!connection.table_exists("no_such_table").expect("introspect"));
    }
}
