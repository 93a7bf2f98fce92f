// SPDX-License-Identifier: AGPL-3.0-or-later

//! [`Deduplicator`] backed by the copy-swap DDL in
//! [`crate::schema_sql::constraints`]. Ranks candidates off the track-count
//! side table when present, falling back to a live count from
//! `release_track` otherwise.

use catcache_repo::dedup::{DedupCounts, Deduplicator};
use catcache_repo::error::Result as RepoResult;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool};

use crate::prelude::{repo_error, Connection};
use crate::schema_sql::constraints::{
    copy_surviving_rows_sql, drop_new_table_sql, row_count_sql, swap_table_statements, ADD_CONSTRAINTS_AND_INDEXES,
    COPY_TABLE_SPECS, CREATE_DEDUP_CANDIDATES_FROM_LIVE_COUNT, CREATE_DEDUP_CANDIDATES_FROM_SIDE_TABLE,
    DEDUP_CANDIDATES_ADD_PRIMARY_KEY, DEDUP_CANDIDATES_COUNT, DEDUP_CANDIDATES_DROP, DEDUP_CANDIDATES_TABLE_EXISTS,
    DROP_FK_CONSTRAINTS, DROP_TRACK_COUNT_SIDE_TABLE, TRACK_COUNT_SIDE_TABLE_EXISTS,
};

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

impl Deduplicator for Connection<'_> {
    fn ensure_dedup_candidates(&mut self) -> RepoResult<u64> {
        let exists = diesel::sql_query(DEDUP_CANDIDATES_TABLE_EXISTS)
            .get_result::<BoolRow>(self.as_mut())
            .map(|row| row.value)
            .map_err(repo_error)?;

        if !exists {
            let side_table_exists = diesel::sql_query(TRACK_COUNT_SIDE_TABLE_EXISTS)
                .get_result::<BoolRow>(self.as_mut())
                .map(|row| row.value)
                .map_err(repo_error)?;
            let create_sql = if side_table_exists {
                CREATE_DEDUP_CANDIDATES_FROM_SIDE_TABLE
            } else {
                CREATE_DEDUP_CANDIDATES_FROM_LIVE_COUNT
            };
            diesel::sql_query(create_sql).execute(self.as_mut()).map_err(repo_error)?;
            diesel::sql_query(DEDUP_CANDIDATES_ADD_PRIMARY_KEY).execute(self.as_mut()).map_err(repo_error)?;
        }

        diesel::sql_query(DEDUP_CANDIDATES_COUNT)
            .get_result::<CountRow>(self.as_mut())
            .map(|row| row.count as u64)
            .map_err(repo_error)
    }

    fn copy_surviving_rows(&mut self) -> RepoResult<DedupCounts> {
        let mut rows_copied = Vec::with_capacity(COPY_TABLE_SPECS.len());
        for &(old_table, new_table, columns, id_col) in COPY_TABLE_SPECS {
            diesel::sql_query(drop_new_table_sql(new_table)).execute(self.as_mut()).map_err(repo_error)?;
            diesel::sql_query(copy_surviving_rows_sql(old_table, new_table, columns, id_col))
                .execute(self.as_mut())
                .map_err(repo_error)?;
            let count = diesel::sql_query(row_count_sql(new_table))
                .get_result::<CountRow>(self.as_mut())
                .map(|row| row.count as u64)
                .map_err(repo_error)?;
            rows_copied.push((static_table_name(old_table), count));
        }
        Ok(DedupCounts { rows_copied })
    }

    fn swap_in_copies(&mut self) -> RepoResult<()> {
        for stmt in DROP_FK_CONSTRAINTS {
            diesel::sql_query(*stmt).execute(self.as_mut()).map_err(repo_error)?;
        }
        for &(old_table, new_table, _, _) in COPY_TABLE_SPECS {
            for stmt in swap_table_statements(old_table, new_table) {
                diesel::sql_query(stmt).execute(self.as_mut()).map_err(repo_error)?;
            }
        }
        Ok(())
    }

    fn add_constraints_and_indexes(&mut self) -> RepoResult<()> {
        for stmt in ADD_CONSTRAINTS_AND_INDEXES {
            diesel::sql_query(*stmt).execute(self.as_mut()).map_err(repo_error)?;
        }
        Ok(())
    }

    fn cleanup(&mut self) -> RepoResult<()> {
        diesel::sql_query(DEDUP_CANDIDATES_DROP).execute(self.as_mut()).map_err(repo_error)?;
        diesel::sql_query(DROP_TRACK_COUNT_SIDE_TABLE).execute(self.as_mut()).map_err(repo_error)?;
        Ok(())
    }
}

/// [`COPY_TABLE_SPECS`] table names are all `'static`; this just recovers
/// that after `old_table` passed through a `&str` parameter above.
fn static_table_name(name: &str) -> &'static str {
    COPY_TABLE_SPECS.iter().find(|&&(old, _, _, _)| old == name).map_or("release", |&(old, _, _, _)| old)
}

#[cfg(test)]
mod tests {
    use catcache_repo::dedup::Deduplicator as _;

    use crate::prelude::tests::establish_connection;
    use crate::prelude::Connection;

    #[test]
    #[ignore = "requires TEST_DATABASE_URL"]
    fn no_master_id_groups_yields_zero_candidates() {
        let mut conn = establish_connection().expect("connection");
        let mut connection = Connection::new(&mut conn);
        let candidates = connection.ensure_dedup_candidates().expect("ensure");
        assert_eq!(candidates, 0);
    }
}
