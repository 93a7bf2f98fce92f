// SPDX-License-Identifier: AGPL-3.0-or-later

//! Row types for the release catalog cache.
//!
//! These mirror the optimized schema: `release`, `release_artist`,
//! `release_track`, `release_track_artist` and `cache_metadata`. Tables
//! dropped by the optimized schema (label, genre, style, the standalone
//! `artist` table) have no corresponding type here.

use derive_more::Display;

/// Primary key of a release, as assigned by the upstream catalog.
pub type ReleaseId = i32;

/// A single release (an album, single, or other catalog unit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub id: ReleaseId,
    pub title: String,
    /// Four-digit release year, extracted from the source `released` field.
    pub release_year: Option<i32>,
    pub master_id: Option<i32>,
    pub artwork_url: Option<String>,
}

/// An artist credited on a release. `extra == false` marks the primary
/// (main) artist; `extra == true` marks a secondary/featured credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseArtist {
    pub release_id: ReleaseId,
    pub artist_name: String,
    pub extra: bool,
}

/// A single track on a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTrack {
    pub release_id: ReleaseId,
    pub sequence: i32,
    pub position: Option<String>,
    pub title: String,
    pub duration: Option<String>,
}

/// An artist credited on a specific track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTrackArtist {
    pub release_id: ReleaseId,
    pub track_sequence: i32,
    pub artist_name: String,
}

/// Provenance and freshness metadata for a cached release.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("cache_metadata(release_id={release_id}, source={source})")]
pub struct CacheMetadata {
    pub release_id: ReleaseId,
    /// Unix timestamp (seconds) this release entry was cached.
    pub cached_at: i64,
    pub source: String,
    /// Unix timestamp (seconds) this release was last confirmed still valid.
    pub last_validated: Option<i64>,
}
