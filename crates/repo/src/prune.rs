// SPDX-License-Identifier: AGPL-3.0-or-later

//! Removing PRUNE-classified releases, either in place (cascading delete,
//! relying on FK `ON DELETE CASCADE` to clean up child tables) or by
//! streaming the KEEP∪REVIEW set into a fresh target store.

use catcache_core::model::ReleaseId;

use crate::error::Result;

/// Size, in bytes and rows, of one release table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableSize {
    pub table: &'static str,
    pub row_count: u64,
    pub size_bytes: u64,
}

/// Prunes releases in place, or copies the surviving set to a fresh target.
pub trait PruneExecutor {
    /// Row count and on-disk size for every release-scoped table.
    fn table_sizes(&mut self) -> Result<Vec<TableSize>>;

    /// Counts, per table, how many rows deleting `release_ids` would remove
    /// (a dry-run estimate; does not delete anything).
    fn count_rows_to_delete(&mut self, release_ids: &[ReleaseId]) -> Result<Vec<TableSize>>;

    /// Deletes `release_ids` from `release`; FK `ON DELETE CASCADE` removes
    /// the corresponding `release_artist`/`release_track`/
    /// `release_track_artist`/`cache_metadata` rows. Returns the number of
    /// `release` rows actually deleted.
    fn prune_in_place(&mut self, release_ids: &[ReleaseId]) -> Result<u64>;

    /// Streams every release whose id is in `keep_ids` into a freshly
    /// initialized target store, with explicit column projection (no
    /// `SELECT *`), for the "copy to target" deployment mode.
    fn copy_to_target(&mut self, keep_ids: &[ReleaseId], target_db_url: &str) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::{PruneExecutor, TableSize};
    use crate::error::Result;
    use catcache_core::model::ReleaseId;

    #[derive(Default)]
    struct FakePruneExecutor {
        deleted: Vec<ReleaseId>,
    }

    impl PruneExecutor for FakePruneExecutor {
        fn table_sizes(&mut self) -> Result<Vec<TableSize>> {
            Ok(vec![TableSize { table: "release", row_count: 100, size_bytes: 1024 }])
        }
        fn count_rows_to_delete(&mut self, release_ids: &[ReleaseId]) -> Result<Vec<TableSize>> {
            Ok(vec![TableSize { table: "release", row_count: release_ids.len() as u64, size_bytes: 0 }])
        }
        fn prune_in_place(&mut self, release_ids: &[ReleaseId]) -> Result<u64> {
            self.deleted.extend_from_slice(release_ids);
            Ok(release_ids.len() as u64)
        }
        fn copy_to_target(&mut self, keep_ids: &[ReleaseId], _target_db_url: &str) -> Result<u64> {
            Ok(keep_ids.len() as u64)
        }
    }

    #[test]
    fn prune_in_place_reports_deleted_count() {
        let mut executor = FakePruneExecutor::default();
        let deleted = executor.prune_in_place(&[1, 2, 3]).expect("prune");
        assert_eq!(deleted, 3);
        assert_eq!(executor.deleted, vec![1, 2, 3]);
    }

    #[test]
    fn copy_to_target_reports_kept_count() {
        let mut executor = FakePruneExecutor::default();
        let copied = executor.copy_to_target(&[1, 2], "postgresql:///target").expect("copy");
        assert_eq!(copied, 2);
    }
}
