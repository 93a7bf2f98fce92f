// SPDX-License-Identifier: AGPL-3.0-or-later

//! Storage-agnostic error type shared by all `catcache-repo` traits.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed state file: {0}")]
    MalformedStateFile(&'static str),

    #[error("unsupported state file version {found:?} (expected {expected})")]
    UnsupportedStateVersion { found: Option<u64>, expected: u32 },

    #[error("{field} mismatch: state has {expected:?}, got {actual:?}")]
    StateMismatch { field: &'static str, expected: String, actual: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
