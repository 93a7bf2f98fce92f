// SPDX-License-Identifier: AGPL-3.0-or-later

//! [`PruneExecutor`]: in-place cascading delete, or streaming the
//! KEEP∪REVIEW set to a freshly migrated target database.

use catcache_core::model::ReleaseId;
use catcache_repo::error::{Error as RepoError, Result as RepoResult};
use catcache_repo::prune::{PruneExecutor, TableSize};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};

use crate::prelude::{repo_error, Connection, DbConnection};
use diesel::Connection as _;

/// Every release-scoped table, in the order FK cascade removes them from
/// `release` (informational only — deletion itself relies on the database's
/// own `ON DELETE CASCADE`, not statement ordering).
const RELEASE_SCOPED_TABLES: &[&str] =
    &["release", "release_artist", "release_track", "release_track_artist", "cache_metadata"];

#[derive(QueryableByName)]
struct TableSizeRow {
    #[diesel(sql_type = BigInt)]
    row_count: i64,
    #[diesel(sql_type = BigInt)]
    size_bytes: i64,
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

fn ids_list(ids: &[ReleaseId]) -> String {
    ids.iter().map(ReleaseId::to_string).collect::<Vec<_>>().join(",")
}

/// Columns, in copy-to-target order, for each table — mirrors
/// [`crate::schema_sql::constraints::COPY_TABLE_SPECS`] minus the dedup-only
/// filtering.
const TARGET_COPY_SPECS: &[(&str, &[&str], &str)] = &[
    ("release", &["id", "title", "release_year", "artwork_url"], "id"),
    ("release_artist", &["release_id", "artist_name", "extra"], "release_id"),
    ("release_track", &["release_id", "sequence", "position", "title", "duration"], "release_id"),
    ("release_track_artist", &["release_id", "track_sequence", "artist_name"], "release_id"),
    ("cache_metadata", &["release_id", "cached_at", "source", "last_validated"], "release_id"),
];

#[derive(QueryableByName)]
struct TextRow {
    #[diesel(sql_type = Nullable<Text>)]
    value: Option<String>,
}

fn sql_literal(value: Option<&str>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(v) => format!("'{}'", v.replace('\'', "''")),
    }
}

impl PruneExecutor for Connection<'_> {
    fn table_sizes(&mut self) -> RepoResult<Vec<TableSize>> {
        let mut sizes = Vec::with_capacity(RELEASE_SCOPED_TABLES.len());
        for &table in RELEASE_SCOPED_TABLES {
            let sql = format!(
                "SELECT count(*) AS row_count, pg_total_relation_size('{table}') AS size_bytes FROM {table}"
            );
            let row = diesel::sql_query(sql).get_result::<TableSizeRow>(self.as_mut()).map_err(repo_error)?;
            sizes.push(TableSize {
                table: static_table_name(table),
                row_count: row.row_count as u64,
                size_bytes: row.size_bytes as u64,
            });
        }
        Ok(sizes)
    }

    fn count_rows_to_delete(&mut self, release_ids: &[ReleaseId]) -> RepoResult<Vec<TableSize>> {
        if release_ids.is_empty() {
            return Ok(RELEASE_SCOPED_TABLES
                .iter()
                .map(|&table| TableSize { table: static_table_name(table), row_count: 0, size_bytes: 0 })
                .collect());
        }
        let ids = ids_list(release_ids);
        let mut counts = Vec::with_capacity(RELEASE_SCOPED_TABLES.len());
        for &table in RELEASE_SCOPED_TABLES {
            let id_col = if table == "release" { "id" } else { "release_id" };
            let sql = format!("SELECT count(*) AS count FROM {table} WHERE {id_col} IN ({ids})");
            let count = diesel::sql_query(sql).get_result::<CountRow>(self.as_mut()).map_err(repo_error)?.count;
            counts.push(TableSize { table: static_table_name(table), row_count: count as u64, size_bytes: 0 });
        }
        Ok(counts)
    }

    fn prune_in_place(&mut self, release_ids: &[ReleaseId]) -> RepoResult<u64> {
        if release_ids.is_empty() {
            return Ok(0);
        }
        let ids = ids_list(release_ids);
        let sql = format!("DELETE FROM release WHERE id IN ({ids})");
        diesel::sql_query(sql).execute(self.as_mut()).map(|n| n as u64).map_err(repo_error)
    }

    fn copy_to_target(&mut self, keep_ids: &[ReleaseId], target_db_url: &str) -> RepoResult<u64> {
        let mut target = DbConnection::establish(target_db_url)
            .map_err(|err| RepoError::Other(anyhow::Error::from(err)))?;
        crate::run_migrations(&mut target).map_err(|err| RepoError::Other(anyhow::anyhow!(err.to_string())))?;

        if keep_ids.is_empty() {
            return Ok(0);
        }
        let ids = ids_list(keep_ids);
        let mut releases_copied = 0u64;

        for &(table, columns, id_col) in TARGET_COPY_SPECS {
            let where_clause = format!("WHERE {id_col} IN ({ids})");
            let select_columns = columns
                .iter()
                .map(|c| format!("{c}::text AS value"))
                .collect::<Vec<_>>();

            // Fetch one column at a time (diesel's `sql_query` needs a fixed
            // result shape per query); zip columns back into rows below.
            let mut column_values: Vec<Vec<Option<String>>> = Vec::with_capacity(columns.len());
            for select_col in &select_columns {
                let sql = format!("SELECT {select_col} FROM {table} {where_clause} ORDER BY {id_col}");
                let rows = diesel::sql_query(sql).load::<TextRow>(self.as_mut()).map_err(repo_error)?;
                column_values.push(rows.into_iter().map(|r| r.value).collect());
            }

            let row_count = column_values.first().map_or(0, Vec::len);
            if row_count == 0 {
                continue;
            }

            let column_list = columns.join(", ");
            let values_clause = (0..row_count)
                .map(|i| {
                    let literals: Vec<String> =
                        column_values.iter().map(|col| sql_literal(col[i].as_deref())).collect();
                    format!("({})", literals.join(", "))
                })
                .collect::<Vec<_>>()
                .join(", ");

            let insert_sql = format!("INSERT INTO {table} ({column_list}) VALUES {values_clause}");
            diesel::sql_query(insert_sql)
                .execute(&mut target)
                .map_err(|err| RepoError::Other(anyhow::Error::from(err)))?;

            if table == "release" {
                releases_copied = row_count as u64;
            }
        }

        Ok(releases_copied)
    }
}

fn static_table_name(name: &str) -> &'static str {
    RELEASE_SCOPED_TABLES.iter().find(|&&t| t == name).copied().unwrap_or("release")
}

#[cfg(test)]
mod tests {
    use catcache_repo::prune::PruneExecutor as _;

    use crate::prelude::tests::establish_connection;
    use crate::prelude::Connection;

    #[test]
    #[ignore = "requires TEST_DATABASE_URL"]
    fn table_sizes_covers_all_release_scoped_tables() {
        let mut conn = establish_connection().expect("connection");
        let mut connection = Connection::new(&mut conn);
        let sizes = connection.table_sizes().expect("sizes");
        assert_eq!(sizes.len(), 5);
    }

    #[test]
    #[ignore = "requires TEST_DATABASE_URL"]
    fn count_rows_to_delete_is_zero_for_empty_input() {
        let mut conn = establish_connection().expect("connection");
        let mut connection = Connection::new(&mut conn);
        let counts = connection.count_rows_to_delete(&[]).expect("count");
        assert!(counts.iter().all(|c| c.row_count == 0));
    }
}
