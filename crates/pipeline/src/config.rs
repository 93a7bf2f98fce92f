// SPDX-License-Identifier: AGPL-3.0-or-later

//! Typed form of the invocation contract: every option an external
//! collaborator can set to control one pipeline run. Building this from
//! process arguments or environment variables is out of scope (CLI parsing
//! is a named non-goal) — this type exists so a caller can construct and
//! pass it in directly.

use std::path::PathBuf;

use catcache_core::matcher::MatcherConfig;

/// Where the CSV export this run imports from came from. Recorded for
/// completeness; the out-of-scope dump-to-CSV conversion this distinguishes
/// between has already happened by the time a [`Config`] is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    BulkFile(PathBuf),
    PreparedDir(PathBuf),
}

/// What to do with PRUNE-classified releases once classification completes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PruneMode {
    /// No library catalog was supplied; skip the prune step entirely.
    #[default]
    Disabled,
    /// Delete PRUNE releases from the target store in place.
    InPlace,
    /// Stream the KEEP∪REVIEW set into a freshly migrated store at the given URL.
    CopyTo(String),
}

/// The literal value written into every `cache_metadata.source` row created
/// by a bulk import — grounded on `import_csv.py`'s own `'bulk_import'` literal.
pub const BULK_IMPORT_SOURCE: &str = "bulk_import";

#[derive(Debug, Clone)]
pub struct Config {
    pub input_source: InputSource,
    pub database_url: String,
    /// Directory containing the prepared CSV export (`release.csv`, etc.).
    pub csv_dir: PathBuf,
    pub library_catalog_path: Option<PathBuf>,
    /// If present (with `library_catalog_path`), copy KEEP∪REVIEW releases
    /// to a fresh store at this URL instead of pruning in place.
    pub target_store_url: Option<String>,
    pub mappings_path: PathBuf,
    pub resume: bool,
    pub state_file_path: PathBuf,
    pub matcher: MatcherConfig,
}

impl Config {
    #[must_use]
    pub fn prune_mode(&self) -> PruneMode {
        if self.library_catalog_path.is_none() {
            return PruneMode::Disabled;
        }
        match &self.target_store_url {
            Some(url) => PruneMode::CopyTo(url.clone()),
            None => PruneMode::InPlace,
        }
    }
}
