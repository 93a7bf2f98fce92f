// SPDX-License-Identifier: AGPL-3.0-or-later

//! The four trigram indexes used for fuzzy substring search, and the two
//! groups ("base" vs "track") they are split into so each can be built once
//! its backing table actually holds data.

/// Indexes on tables populated by the `import_csv` step.
pub const BASE_TRIGRAM_INDEXES: &[(&str, &str)] = &[
    ("idx_release_title_trgm", "release (lower(f_unaccent(title)) gin_trgm_ops)"),
    ("idx_release_artist_name_trgm", "release_artist (lower(f_unaccent(artist_name)) gin_trgm_ops)"),
];

/// Indexes on tables populated by the `import_tracks` step.
pub const TRACK_TRIGRAM_INDEXES: &[(&str, &str)] = &[
    ("idx_release_track_title_trgm", "release_track (lower(f_unaccent(title)) gin_trgm_ops)"),
    ("idx_release_track_artist_name_trgm", "release_track_artist (lower(f_unaccent(artist_name)) gin_trgm_ops)"),
];

/// Builds a `CREATE INDEX [CONCURRENTLY] ... USING gin (...)` statement.
///
/// `CONCURRENTLY` avoids locking the table against writes while the index
/// builds, but cannot run inside a transaction block; `concurrently` should
/// be `false` only for a fresh database with no other connections (e.g.
/// integration tests), matching `run_pipeline`'s `strip_concurrently` switch.
#[must_use]
pub fn create_trigram_index_sql(name: &str, using: &str, concurrently: bool) -> String {
    let modifier = if concurrently { "CONCURRENTLY " } else { "" };
    format!("CREATE INDEX {modifier}IF NOT EXISTS {name} ON {using}")
}
