// SPDX-License-Identifier: AGPL-3.0-or-later

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]
#![warn(unreachable_pub)]

use diesel::{PgConnection, RunQueryDsl as _};
use thiserror::Error;

pub mod connection;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Database(#[from] diesel::result::Error),

    #[error(transparent)]
    DatabaseConnection(#[from] diesel::ConnectionError),

    #[error(transparent)]
    DatabaseConnectionPool(#[from] r2d2::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Release-scoped tables that take part in `VACUUM`/`ANALYZE` maintenance.
///
/// `release_label` is deliberately absent: the optimized schema never
/// creates that table (it's dropped at import time), even though the
/// original pipeline's vacuum step still names it.
pub const VACUUMED_TABLES: &[&str] =
    &["release", "release_artist", "release_track", "release_track_artist", "cache_metadata"];

/// Reclaims dead tuples and rebuilds the visibility map for every table in
/// [`VACUUMED_TABLES`]. Run after `dedup`/`prune` drop a large share of
/// `release`'s rows, since an ordinary autovacuum pass may lag behind a
/// bulk operation that size.
///
/// A failure on one table is logged and does not abort the rest: vacuum
/// failures are warnings, never errors, at every level of this crate.
pub fn vacuum_database(connection: &mut PgConnection) {
    for &table in VACUUMED_TABLES {
        log::info!("VACUUM FULL {table} ...");
        if let Err(err) = diesel::dsl::sql_query(format!("VACUUM FULL {table}")).execute(connection) {
            log::warn!("VACUUM FULL {table} failed: {err}");
        }
    }
}

/// Gathers statistics about the schema and generates hints for the query
/// planner. `VACUUM FULL` already does this implicitly, but a standalone
/// `ANALYZE` is cheap and makes the dependency explicit for callers that
/// skip vacuuming.
pub fn analyze_and_optimize_database_stats(connection: &mut PgConnection) -> Result<()> {
    for &table in VACUUMED_TABLES {
        diesel::dsl::sql_query(format!("ANALYZE {table}")).execute(connection)?;
    }
    Ok(())
}

pub fn cleanse_database(connection: &mut PgConnection, vacuum: bool) -> Result<()> {
    if vacuum {
        log::info!("Rebuilding database storage before analysis & optimization");
        vacuum_database(connection);
    }

    log::info!("Analyzing and optimizing database statistics");
    analyze_and_optimize_database_stats(connection)?;

    Ok(())
}
