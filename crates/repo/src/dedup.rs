// SPDX-License-Identifier: AGPL-3.0-or-later

//! Deduplication of releases sharing a `master_id`, via "copy-swap" rather
//! than `DELETE`: copy the surviving rows into fresh tables, then rename
//! them over the originals. Avoids the huge write-ahead-log churn of
//! deleting ~88% of rows in place.
//!
//! Ranking within a `master_id` group keeps the release with the most
//! tracks (ties broken by lowest id) — see [`DedupRanking`]. `dedup` runs
//! before tracks are imported, so the track count comes from the side table
//! built during `import_csv` (a live count from `release_track` is only a
//! fallback for a store where that side table is missing). Track rows don't
//! exist yet at this point in the pipeline, so only the three base tables
//! are copy-swapped; `release_track`/`release_track_artist` are populated
//! later, by `import_tracks`.

use crate::error::Result;

/// Tables copy-swapped by dedup, in the order they must be processed. Child
/// tables are copied before `release` itself is renamed into place, so that
/// `release`'s id column is stable for the whole operation.
pub const DEDUP_TABLES: &[&str] = &["release_artist", "cache_metadata", "release"];

/// How survivors within a `master_id` group are ranked; the first-ranked
/// release in each group is kept, the rest are marked for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupRanking;

/// Row counts produced by the copy stage, one entry per [`DEDUP_TABLES`] entry.
#[derive(Debug, Clone, Default)]
pub struct DedupCounts {
    pub rows_copied: Vec<(&'static str, u64)>,
}

/// Storage-specific implementation of the copy-swap deduplication strategy.
pub trait Deduplicator {
    /// Computes (or loads, if already computed by a prior failed attempt)
    /// the set of release ids to remove: all but the top-ranked release
    /// (by track count descending, then id ascending) within each
    /// `master_id` group. Track counts come from the track-count side table
    /// when it exists, falling back to a live count from `release_track`
    /// otherwise. Returns the number of ids to remove.
    fn ensure_dedup_candidates(&mut self) -> Result<u64>;

    /// Copies every row from [`DEDUP_TABLES`] whose release is *not* in the
    /// dedup-candidate set into a freshly created sibling table.
    fn copy_surviving_rows(&mut self) -> Result<DedupCounts>;

    /// Atomically swaps each copied table over its original (rename old ->
    /// `_old`, new -> original name, then `DROP ... CASCADE` the old table).
    fn swap_in_copies(&mut self) -> Result<()>;

    /// Recreates primary keys, foreign keys (with `ON DELETE CASCADE`), FK
    /// indexes, and trigram indexes on the swapped-in tables, plus the FK
    /// from `release_track`/`release_track_artist` back to `release` (those
    /// two tables are not copy-swapped themselves — they are still empty at
    /// this point — but their FK constraint was dropped along with
    /// everything else that referenced the old `release`). Trigram indexes
    /// on `release_track`/`release_track_artist` are left to the later
    /// `create_track_indexes` step, once those tables actually hold rows.
    fn add_constraints_and_indexes(&mut self) -> Result<()>;

    /// Drops the dedup-candidate working table and the track-count side
    /// table, both transient.
    fn cleanup(&mut self) -> Result<()>;
}

/// Runs the full copy-swap sequence against `dedup`, short-circuiting with
/// no-op if there are no duplicates to remove.
pub fn run(dedup: &mut dyn Deduplicator) -> Result<Option<DedupCounts>> {
    let candidates = dedup.ensure_dedup_candidates()?;
    if candidates == 0 {
        return Ok(None);
    }
    let counts = dedup.copy_surviving_rows()?;
    dedup.swap_in_copies()?;
    dedup.add_constraints_and_indexes()?;
    dedup.cleanup()?;
    Ok(Some(counts))
}

#[cfg(test)]
mod tests {
    use super::{run, DedupCounts, Deduplicator};
    use crate::error::Result;

    #[derive(Default)]
    struct FakeDeduplicator {
        candidates: u64,
        calls: Vec<&'static str>,
    }

    impl Deduplicator for FakeDeduplicator {
        fn ensure_dedup_candidates(&mut self) -> Result<u64> {
            self.calls.push("ensure");
            Ok(self.candidates)
        }
        fn copy_surviving_rows(&mut self) -> Result<DedupCounts> {
            self.calls.push("copy");
            Ok(DedupCounts { rows_copied: vec![("release", 12)] })
        }
        fn swap_in_copies(&mut self) -> Result<()> {
            self.calls.push("swap");
            Ok(())
        }
        fn add_constraints_and_indexes(&mut self) -> Result<()> {
            self.calls.push("constraints");
            Ok(())
        }
        fn cleanup(&mut self) -> Result<()> {
            self.calls.push("cleanup");
            Ok(())
        }
    }

    #[test]
    fn no_candidates_short_circuits() {
        let mut dedup = FakeDeduplicator { candidates: 0, ..Default::default() };
        let result = run(&mut dedup).expect("run");
        assert!(result.is_none());
        assert_eq!(dedup.calls, vec!["ensure"]);
    }

    #[test]
    fn candidates_run_full_sequence() {
        let mut dedup = FakeDeduplicator { candidates: 5, ..Default::default() };
        let result = run(&mut dedup).expect("run");
        assert!(result.is_some());
        assert_eq!(dedup.calls, vec!["ensure", "copy", "swap", "constraints", "cleanup"]);
    }
}
