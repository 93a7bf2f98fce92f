// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sequences the eight pipeline steps with resumable, skip-if-completed
//! semantics, and the store-wait loop that precedes the whole run.

use std::thread::sleep;
use std::time::{Duration, Instant};

use catcache_core::classifier::ClassifierPipeline;
use catcache_core::matcher::ArtistMappings;
use catcache_repo::import::{count_track_occurrences, project_csv_rows, RELEASE_IMPORT_TABLES, TRACK_IMPORT_TABLES};
use catcache_repo::prelude::{BulkImporter, ClassificationSource, PruneExecutor};
use catcache_repo::state::{PipelineState, StepName};
use catcache_repo_postgres::prelude::Connection;
use catcache_repo_postgres::schema_sql::indexes::{create_trigram_index_sql, BASE_TRIGRAM_INDEXES, TRACK_TRIGRAM_INDEXES};
use catcache_repo_postgres::DbConnection;
use diesel::prelude::*;
use diesel::Connection as _;

use crate::config::{Config, PruneMode, BULK_IMPORT_SOURCE};
use crate::error::{Error, Result};
use crate::{library, report};

/// Initial retry delay for [`wait_for_store`].
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
/// Retry delay cap.
const MAX_BACKOFF: Duration = Duration::from_secs(3);
/// Hard deadline for the whole wait loop.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Polls `database_url` with exponential backoff (0.5s, doubling, capped at
/// 3s) until a connection succeeds or 30 seconds elapse.
pub fn wait_for_store(database_url: &str) -> Result<()> {
    log::info!("Waiting for the store at {database_url} ...");
    let deadline = Instant::now() + CONNECT_TIMEOUT;
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match DbConnection::establish(database_url) {
            Ok(_) => {
                log::info!("Store is ready.");
                return Ok(());
            }
            Err(_) if Instant::now() < deadline => {
                sleep(backoff);
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
            Err(_) => {
                return Err(Error::StoreUnreachable {
                    url: database_url.to_string(),
                    timeout_secs: CONNECT_TIMEOUT.as_secs(),
                });
            }
        }
    }
}

/// Loads the state file if present and resumable, falling back to
/// introspecting the live store when resuming without one.
fn load_or_infer_state(config: &Config, conn: &mut DbConnection) -> Result<PipelineState> {
    if config.resume && config.state_file_path.exists() {
        let state = PipelineState::load(&config.state_file_path)?;
        state.validate_resume(&config.database_url, &config.csv_dir.to_string_lossy())?;
        return Ok(state);
    }
    if config.resume {
        let csv_dir = config.csv_dir.to_string_lossy().to_string();
        let mut connection = Connection::new(conn);
        let inferred = catcache_repo::introspect::infer_pipeline_state(&mut connection, &config.database_url)?;
        // `infer_pipeline_state` has no way to know `csv_dir`, so its result
        // always carries an empty one; copy only the completion flags over
        // onto a state stamped with the real value.
        let mut state = PipelineState::new(&config.database_url, csv_dir);
        for &step in &catcache_repo::state::STEP_NAMES {
            if inferred.is_completed(step) {
                state.mark_completed(step);
            }
        }
        return Ok(state);
    }
    Ok(PipelineState::new(&config.database_url, config.csv_dir.to_string_lossy().to_string()))
}

fn run_schema_step(conn: &mut DbConnection) -> Result<()> {
    catcache_repo_postgres::run_migrations(conn).map_err(|err| Error::Other(anyhow::anyhow!(err.to_string())))?;
    Ok(())
}

fn run_import_csv_step(config: &Config, conn: &mut DbConnection) -> Result<()> {
    let mut connection = Connection::new(conn);
    for spec in RELEASE_IMPORT_TABLES {
        let csv_path = config.csv_dir.join(spec.csv_file);
        if !csv_path.exists() {
            log::warn!("Skipping {} (not found)", spec.csv_file);
            continue;
        }
        let (rows, outcome) = project_csv_rows(spec, &csv_path)?;
        log::info!(
            "{}: imported {}, skipped {} (null required), skipped {} (duplicate)",
            spec.table,
            outcome.imported,
            outcome.skipped_null_required,
            outcome.skipped_duplicate
        );
        connection.write_rows(spec, &rows)?;
    }
    let artwork_updated = connection.import_artwork(&config.csv_dir)?;
    log::info!("Updated artwork_url on {artwork_updated} releases");
    let seeded = connection.populate_cache_metadata(BULK_IMPORT_SOURCE)?;
    log::info!("Seeded cache_metadata for {seeded} releases");

    // Built here, not in `import_tracks`, so dedup's ranking query (which
    // runs before tracks are imported) has real counts to work with.
    let track_csv_path = config.csv_dir.join("release_track.csv");
    if track_csv_path.exists() {
        let counts = count_track_occurrences(&track_csv_path)?;
        let sided = connection.write_track_count_side_table(&counts)?;
        log::info!("Built track-count side table for {sided} releases");
    } else {
        log::warn!("Skipping track-count side table (release_track.csv not found)");
    }
    Ok(())
}

fn run_create_indexes_step(conn: &mut DbConnection) -> Result<()> {
    for &(name, using) in BASE_TRIGRAM_INDEXES {
        let sql = create_trigram_index_sql(name, using, true);
        diesel::sql_query(sql).execute(conn).map_err(|err| Error::Other(anyhow::Error::from(err)))?;
    }
    Ok(())
}

/// Imports track-level CSV rows, filtered to releases that survived dedup
/// (ones dropped are silently excluded rather than tripping the FK on
/// `release_id`).
fn run_import_tracks_step(config: &Config, conn: &mut DbConnection) -> Result<()> {
    let mut connection = Connection::new(conn);
    for spec in TRACK_IMPORT_TABLES {
        let csv_path = config.csv_dir.join(spec.csv_file);
        if !csv_path.exists() {
            log::warn!("Skipping {} (not found)", spec.csv_file);
            continue;
        }
        let (rows, outcome) = project_csv_rows(spec, &csv_path)?;
        let written = connection.write_track_rows(spec, &rows)?;
        log::info!(
            "{}: imported {written} of {} (null required skipped {}, duplicate skipped {}, {} belonged to releases dropped by dedup)",
            spec.table,
            outcome.imported,
            outcome.skipped_null_required,
            outcome.skipped_duplicate,
            outcome.imported as u64 - written
        );
    }
    Ok(())
}

fn run_create_track_indexes_step(conn: &mut DbConnection) -> Result<()> {
    for &(name, using) in TRACK_TRIGRAM_INDEXES {
        let sql = create_trigram_index_sql(name, using, true);
        diesel::sql_query(sql).execute(conn).map_err(|err| Error::Other(anyhow::Error::from(err)))?;
    }
    Ok(())
}

fn run_dedup_step(conn: &mut DbConnection) -> Result<()> {
    let mut connection = Connection::new(conn);
    match catcache_repo::dedup::run(&mut connection)? {
        Some(counts) => {
            for (table, rows) in counts.rows_copied {
                log::info!("dedup: {table} kept {rows} rows");
            }
        }
        None => log::info!("dedup: no duplicate master_id groups found"),
    }
    Ok(())
}

/// Runs the classifier against the configured library catalog and either
/// prunes in place or copies the surviving set to a target store. A no-op
/// (immediately completed) when no library catalog is configured.
fn run_prune_step(config: &Config, conn: &mut DbConnection) -> Result<()> {
    let Some(library_path) = &config.library_catalog_path else {
        log::info!("prune: no library catalog configured, skipping");
        return Ok(());
    };

    let index = library::build_library_index(library_path)?;
    let mappings = catcache_repo::mappings::load(&config.mappings_path)?;
    let artist_mappings: ArtistMappings = mappings.into();

    let releases = {
        let mut connection = Connection::new(conn);
        connection.load_releases_for_classification()?
    };

    let pipeline = ClassifierPipeline::new(&index, artist_mappings, config.matcher);
    let classification = pipeline.classify_all(&releases);
    log::info!(
        "classified {} releases: {} keep, {} prune, {} review",
        classification.total_releases,
        classification.keep_ids.len(),
        classification.prune_ids.len(),
        classification.review_ids.len()
    );

    let mut connection = Connection::new(conn);
    match config.prune_mode() {
        PruneMode::Disabled => unreachable!("library_catalog_path is Some"),
        PruneMode::InPlace => {
            let deleted = connection.prune_in_place(&classification.prune_ids)?;
            log::info!("prune: deleted {deleted} releases in place");
        }
        PruneMode::CopyTo(target_url) => {
            let mut keep_ids = classification.keep_ids.clone();
            keep_ids.extend(classification.review_ids.iter().copied());
            let copied = connection.copy_to_target(&keep_ids, &target_url)?;
            log::info!("prune: copied {copied} releases to {target_url}");
        }
    }

    let sizes = connection.table_sizes()?;
    log::info!("\n{}", report::format_report(&classification, &sizes));

    Ok(())
}

fn run_vacuum_step(conn: &mut DbConnection) -> Result<()> {
    catcache_storage_postgres::cleanse_database(conn, true)?;
    Ok(())
}

/// Runs every pipeline step in order, skipping ones already marked completed
/// in `state`, saving after each attempted step.
pub fn run(config: &Config) -> Result<()> {
    wait_for_store(&config.database_url)?;

    let mut conn = DbConnection::establish(&config.database_url)
        .map_err(|err| Error::Other(anyhow::Error::from(err)))?;

    let mut state = load_or_infer_state(config, &mut conn)?;

    for &step in &catcache_repo::state::STEP_NAMES {
        if state.is_completed(step) {
            log::info!("{step}: already completed, skipping");
            continue;
        }

        // Steps that are no-ops under the current configuration are marked
        // completed immediately without running anything.
        if step == StepName::Prune && config.library_catalog_path.is_none() {
            log::info!("{step}: no-op under current configuration");
            state.mark_completed(step);
            state.save(&config.state_file_path)?;
            continue;
        }

        log::info!("{step}: starting");
        let start = Instant::now();
        let result = match step {
            StepName::CreateSchema => run_schema_step(&mut conn),
            StepName::ImportCsv => run_import_csv_step(config, &mut conn),
            StepName::CreateIndexes => run_create_indexes_step(&mut conn),
            StepName::ImportTracks => run_import_tracks_step(config, &mut conn),
            StepName::CreateTrackIndexes => run_create_track_indexes_step(&mut conn),
            StepName::Dedup => run_dedup_step(&mut conn),
            StepName::Prune => run_prune_step(config, &mut conn),
            StepName::Vacuum => run_vacuum_step(&mut conn),
        };

        match result {
            Ok(()) => {
                log::info!("{step}: completed in {:.1}s", start.elapsed().as_secs_f64());
                state.mark_completed(step);
                state.save(&config.state_file_path)?;
            }
            Err(err) => {
                log::error!("{step}: failed after {:.1}s: {err}", start.elapsed().as_secs_f64());
                state.mark_failed(step, err.to_string());
                state.save(&config.state_file_path)?;
                return Err(err);
            }
        }
    }

    Ok(())
}
