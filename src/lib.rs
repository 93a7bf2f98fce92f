// SPDX-License-Identifier: AGPL-3.0-or-later

//! Facade crate that re-exports the `catcache` sub-crates behind Cargo features,
//! mirroring the layered `core` / `repo` / `repo-<backend>` / `pipeline` split.

pub use catcache_core as core;

#[cfg(feature = "repo")]
pub use catcache_repo as repo;

#[cfg(feature = "postgres")]
pub use catcache_repo_postgres as repo_postgres;

#[cfg(feature = "postgres")]
pub use catcache_storage_postgres as storage_postgres;

#[cfg(feature = "postgres")]
pub use catcache_pipeline as pipeline;
