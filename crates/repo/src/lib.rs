// SPDX-License-Identifier: AGPL-3.0-or-later

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

//! Storage-agnostic traits and types for the resumable ETL pipeline: the
//! JSON state store, artist-mapping persistence, and the storage-backend
//! seams (introspection, bulk import, dedup, prune) that
//! `catcache-repo-postgres` implements.

pub mod classify;
pub mod dedup;
pub mod error;
pub mod import;
pub mod introspect;
pub mod mappings;
pub mod prune;
pub mod state;

pub mod prelude {
    //! Re-exports of the most commonly used types.

    pub use crate::classify::ClassificationSource;
    pub use crate::dedup::Deduplicator;
    pub use crate::error::{Error, Result};
    pub use crate::import::BulkImporter;
    pub use crate::introspect::StoreIntrospector;
    pub use crate::mappings::ArtistMappingsFile;
    pub use crate::prune::PruneExecutor;
    pub use crate::state::{PipelineState, StepName};
}
