// SPDX-License-Identifier: AGPL-3.0-or-later

//! Orchestrator-level error type: a union over every sub-crate's error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Repo(#[from] catcache_repo::error::Error),

    #[error(transparent)]
    Storage(#[from] catcache_storage_postgres::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("timed out waiting for the store at {url} after {timeout_secs}s")]
    StoreUnreachable { url: String, timeout_secs: u64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
