// SPDX-License-Identifier: AGPL-3.0-or-later

//! Inferring pipeline state from live store structure, for resuming a run
//! that has no state file (e.g. the state file was deleted, or this is the
//! first `--resume` against a store built by another tool).
//!
//! Steps that cannot be safely inferred from structure alone (`prune` and
//! `vacuum`, which leave no structural trace) are left pending — they are
//! cheap and idempotent to re-run, so a false "not completed" costs time,
//! not correctness.

use crate::error::Result;
use crate::state::{PipelineState, StepName};

/// Trigram index names created by `create_indexes` (release/release_artist only).
pub const RELEASE_TRIGRAM_INDEXES: &[&str] = &["idx_release_title_trgm", "idx_release_artist_name_trgm"];

/// Trigram index names created by `create_track_indexes`, once track rows exist to index.
pub const TRACK_TRIGRAM_INDEXES: &[&str] =
    &["idx_release_track_title_trgm", "idx_release_track_artist_name_trgm"];

/// Storage-agnostic introspection of the target store's structure.
pub trait StoreIntrospector {
    fn table_exists(&mut self, table: &str) -> Result<bool>;
    fn table_has_rows(&mut self, table: &str) -> Result<bool>;
    fn column_exists(&mut self, table: &str, column: &str) -> Result<bool>;
    /// Returns `true` if every index in `names` currently exists.
    fn indexes_exist(&mut self, names: &[&str]) -> Result<bool>;
}

/// Infers pipeline state from store structure for a bare `db_url` with no
/// known `csv_dir` (the introspected state's `csv_dir` is always empty;
/// callers resuming from introspection should not call `validate_resume`).
pub fn infer_pipeline_state(introspector: &mut dyn StoreIntrospector, db_url: &str) -> Result<PipelineState> {
    let mut state = PipelineState::new(db_url, "");

    if !introspector.table_exists("release")? {
        return Ok(state);
    }
    state.mark_completed(StepName::CreateSchema);

    if !introspector.table_has_rows("release")? {
        return Ok(state);
    }
    state.mark_completed(StepName::ImportCsv);

    if !introspector.indexes_exist(RELEASE_TRIGRAM_INDEXES)? {
        return Ok(state);
    }
    state.mark_completed(StepName::CreateIndexes);

    // The copy-swap in the dedup step drops `master_id` from the rebuilt
    // `release` table (see the explicit column lists `repo-postgres`'s
    // `Deduplicator` impl copies), so its absence is the on-disk signal
    // that dedup has already run. Checked before the track-level steps,
    // since dedup now runs before tracks are imported.
    if introspector.column_exists("release", "master_id")? {
        return Ok(state);
    }
    state.mark_completed(StepName::Dedup);

    if !introspector.table_has_rows("release_track")? {
        return Ok(state);
    }
    state.mark_completed(StepName::ImportTracks);

    if !introspector.indexes_exist(TRACK_TRIGRAM_INDEXES)? {
        return Ok(state);
    }
    state.mark_completed(StepName::CreateTrackIndexes);

    // `prune` and `vacuum` are not inferred from structure; they stay
    // pending and simply re-run (idempotent, cheap relative to the steps
    // above).
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::{infer_pipeline_state, StoreIntrospector};
    use crate::error::Result;
    use crate::state::StepName;

    struct FakeIntrospector {
        tables: Vec<&'static str>,
        tables_with_rows: Vec<&'static str>,
        columns: Vec<(&'static str, &'static str)>,
        indexes: Vec<&'static str>,
    }

    impl StoreIntrospector for FakeIntrospector {
        fn table_exists(&mut self, table: &str) -> Result<bool> {
            Ok(self.tables.contains(&table))
        }
        fn table_has_rows(&mut self, table: &str) -> Result<bool> {
            Ok(self.tables_with_rows.contains(&table))
        }
        fn column_exists(&mut self, table: &str, column: &str) -> Result<bool> {
            Ok(self.columns.iter().any(|&(t, c)| t == table && c == column))
        }
        fn indexes_exist(&mut self, names: &[&str]) -> Result<bool> {
            Ok(names.iter().all(|n| self.indexes.contains(n)))
        }
    }

    #[test]
    fn empty_store_infers_nothing_completed() {
        let mut introspector =
            FakeIntrospector { tables: vec![], tables_with_rows: vec![], columns: vec![], indexes: vec![] };
        let state = infer_pipeline_state(&mut introspector, "postgresql:///discogs").expect("infer");
        assert!(!state.is_completed(StepName::CreateSchema));
    }

    #[test]
    fn dedup_inferred_absent_when_master_id_column_present() {
        let mut introspector = FakeIntrospector {
            tables: vec!["release"],
            tables_with_rows: vec!["release"],
            columns: vec![("release", "master_id")],
            indexes: vec!["idx_release_title_trgm", "idx_release_artist_name_trgm"],
        };
        let state = infer_pipeline_state(&mut introspector, "postgresql:///discogs").expect("infer");
        assert!(state.is_completed(StepName::CreateIndexes));
        assert!(!state.is_completed(StepName::Dedup));
    }

    #[test]
    fn dedup_inferred_complete_when_master_id_column_absent() {
        let mut introspector = FakeIntrospector {
            tables: vec!["release", "release_track"],
            tables_with_rows: vec!["release", "release_track"],
            columns: vec![],
            indexes: vec![
                "idx_release_title_trgm",
                "idx_release_artist_name_trgm",
                "idx_release_track_title_trgm",
                "idx_release_track_artist_name_trgm",
            ],
        };
        let state = infer_pipeline_state(&mut introspector, "postgresql:///discogs").expect("infer");
        assert!(state.is_completed(StepName::ImportTracks));
        assert!(state.is_completed(StepName::CreateTrackIndexes));
        assert!(state.is_completed(StepName::Dedup));
    }
}
