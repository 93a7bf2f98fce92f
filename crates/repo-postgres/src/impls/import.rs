// SPDX-License-Identifier: AGPL-3.0-or-later

//! [`BulkImporter`] backed by batched, multi-row `INSERT` statements.
//!
//! `COPY ... FROM STDIN` (what `import_csv.py` actually uses) is the faster
//! path, but diesel's stable API has no portable way to stream a `COPY` from
//! already-projected in-memory rows without dropping to raw libpq. Batched
//! `INSERT`s keep the same column-projection contract without that jump,
//! relying on Postgres's implicit cast from untyped string literals to each
//! column's declared type (the same coercion a plain `INSERT ... VALUES
//! ('1969')` gets against an `integer` column).

use std::path::Path;

use catcache_repo::error::Result as RepoResult;
use catcache_repo::import::{BulkImporter, ProjectedRow, TableImportSpec};
use diesel::prelude::*;

use crate::prelude::{repo_error, Connection};
use crate::schema_sql::constraints::CREATE_TRACK_COUNT_SIDE_TABLE;

/// Rows per batched `INSERT`; keeps statement text and parse time bounded
/// for very large CSV exports.
const BATCH_SIZE: usize = 2_000;

fn sql_literal(value: Option<&str>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(v) => format!("'{}'", v.replace('\'', "''")),
    }
}

impl BulkImporter for Connection<'_> {
    fn write_rows(&mut self, spec: &TableImportSpec, rows: &[ProjectedRow]) -> RepoResult<()> {
        let db_columns: Vec<&str> = spec.columns.iter().map(|c| c.db_name).collect();
        let column_list = db_columns.join(", ");

        for chunk in rows.chunks(BATCH_SIZE) {
            let values_clause = chunk
                .iter()
                .map(|row| {
                    let literals: Vec<String> = row.iter().map(|v| sql_literal(v.as_deref())).collect();
                    format!("({})", literals.join(", "))
                })
                .collect::<Vec<_>>()
                .join(", ");

            let sql = format!("INSERT INTO {} ({column_list}) VALUES {values_clause}", spec.table);
            diesel::sql_query(sql).execute(self.as_mut()).map_err(repo_error)?;
        }
        Ok(())
    }

    fn import_artwork(&mut self, csv_dir: &Path) -> RepoResult<usize> {
        let csv_path = csv_dir.join("release_image.csv");
        if !csv_path.exists() {
            return Ok(0);
        }

        // Mirrors `import_artwork` in `import_csv.py`: load release_id,
        // type, uri into a scratch table, prefer the `primary`-typed image
        // per release, then fall back to the first image seen.
        diesel::sql_query(
            "CREATE TEMPORARY TABLE _artwork (release_id integer, type text, uri text) ON COMMIT DROP",
        )
        .execute(self.as_mut())
        .map_err(repo_error)?;

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(&csv_path).map_err(|err| {
            catcache_repo::error::Error::Other(anyhow::Error::from(err))
        })?;
        let header = reader.headers().map_err(|err| catcache_repo::error::Error::Other(anyhow::Error::from(err)))?.clone();
        let release_id_idx = header.iter().position(|h| h == "release_id");
        let type_idx = header.iter().position(|h| h == "type");
        let uri_idx = header.iter().position(|h| h == "uri");
        let (Some(release_id_idx), Some(type_idx), Some(uri_idx)) = (release_id_idx, type_idx, uri_idx) else {
            return Ok(0);
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| catcache_repo::error::Error::Other(anyhow::Error::from(err)))?;
            rows.push((
                record.get(release_id_idx).filter(|v| !v.is_empty()).map(str::to_string),
                record.get(type_idx).filter(|v| !v.is_empty()).map(str::to_string),
                record.get(uri_idx).filter(|v| !v.is_empty()).map(str::to_string),
            ));
        }

        for chunk in rows.chunks(BATCH_SIZE) {
            let values_clause = chunk
                .iter()
                .map(|(release_id, image_type, uri)| {
                    format!(
                        "({}, {}, {})",
                        sql_literal(release_id.as_deref()),
                        sql_literal(image_type.as_deref()),
                        sql_literal(uri.as_deref()),
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            if values_clause.is_empty() {
                continue;
            }
            diesel::sql_query(format!("INSERT INTO _artwork (release_id, type, uri) VALUES {values_clause}"))
                .execute(self.as_mut())
                .map_err(repo_error)?;
        }

        let updated = diesel::sql_query(
            "UPDATE release r SET artwork_url = a.uri FROM (
                SELECT DISTINCT ON (release_id) release_id, uri
                FROM _artwork
                ORDER BY release_id, (type = 'primary') DESC
            ) a WHERE a.release_id = r.id",
        )
        .execute(self.as_mut())
        .map_err(repo_error)?;

        Ok(updated)
    }

    fn populate_cache_metadata(&mut self, source: &str) -> RepoResult<usize> {
        let sql = format!(
            "INSERT INTO cache_metadata (release_id, source)
             SELECT id, '{}' FROM release
             ON CONFLICT (release_id) DO NOTHING",
            source.replace('\'', "''"),
        );
        diesel::sql_query(sql).execute(self.as_mut()).map_err(repo_error)
    }

    fn write_track_count_side_table(&mut self, counts: &[(i64, i64)]) -> RepoResult<u64> {
        diesel::sql_query(CREATE_TRACK_COUNT_SIDE_TABLE).execute(self.as_mut()).map_err(repo_error)?;
        diesel::sql_query("TRUNCATE TABLE release_track_count").execute(self.as_mut()).map_err(repo_error)?;

        for chunk in counts.chunks(BATCH_SIZE) {
            let values_clause = chunk
                .iter()
                .map(|(release_id, track_count)| format!("({release_id}, {track_count})"))
                .collect::<Vec<_>>()
                .join(", ");
            if values_clause.is_empty() {
                continue;
            }
            diesel::sql_query(format!("INSERT INTO release_track_count (release_id, track_count) VALUES {values_clause}"))
                .execute(self.as_mut())
                .map_err(repo_error)?;
        }

        Ok(counts.len() as u64)
    }

    fn write_track_rows(&mut self, spec: &TableImportSpec, rows: &[ProjectedRow]) -> RepoResult<u64> {
        let db_columns: Vec<&str> = spec.columns.iter().map(|c| c.db_name).collect();
        let column_list = db_columns.join(", ");
        let mut inserted = 0u64;

        for chunk in rows.chunks(BATCH_SIZE) {
            let values_clause = chunk
                .iter()
                .map(|row| {
                    let literals: Vec<String> = row.iter().map(|v| sql_literal(v.as_deref())).collect();
                    format!("({})", literals.join(", "))
                })
                .collect::<Vec<_>>()
                .join(", ");
            if values_clause.is_empty() {
                continue;
            }

            // Rows for releases that didn't survive dedup are silently
            // dropped rather than hitting the FK constraint on release_id.
            let sql = format!(
                "INSERT INTO {} ({column_list}) \
                 SELECT v.* FROM (VALUES {values_clause}) AS v({column_list}) \
                 WHERE v.release_id IN (SELECT id FROM release)",
                spec.table
            );
            let rows_inserted = diesel::sql_query(sql).execute(self.as_mut()).map_err(repo_error)?;
            inserted += rows_inserted as u64;
        }
        Ok(inserted)
    }
}
