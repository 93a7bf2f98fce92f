// SPDX-License-Identifier: AGPL-3.0-or-later

//! DDL re-applied to the three release-scoped base tables after the dedup
//! copy-swap, since `CREATE TABLE ... AS SELECT` carries over neither
//! constraints nor indexes. Also the track-count side table consumed by
//! dedup's ranking query, and the two variants of that ranking query itself.

/// Name of the transient `(release_id, track_count)` side table built during
/// `import_csv`, consumed here, and dropped once dedup completes.
pub const TRACK_COUNT_SIDE_TABLE: &str = "release_track_count";

pub const TRACK_COUNT_SIDE_TABLE_EXISTS: &str = "
    SELECT EXISTS (
        SELECT FROM information_schema.tables WHERE table_name = 'release_track_count'
    )
";

pub const CREATE_TRACK_COUNT_SIDE_TABLE: &str = "
    CREATE UNLOGGED TABLE IF NOT EXISTS release_track_count (
        release_id  integer PRIMARY KEY,
        track_count integer NOT NULL
    )
";

pub const DROP_TRACK_COUNT_SIDE_TABLE: &str = "DROP TABLE IF EXISTS release_track_count";

/// Ranks releases within a `master_id` group by track count descending,
/// then id ascending, and materializes every release *outside* rank 1 (the
/// ones to discard) into a working table. Uses the track-count side table
/// built during `import_csv` — tracks themselves are not imported until
/// after dedup runs.
pub const CREATE_DEDUP_CANDIDATES_FROM_SIDE_TABLE: &str = "
    CREATE UNLOGGED TABLE dedup_delete_ids AS
    SELECT id AS release_id FROM (
        SELECT r.id, r.master_id,
               ROW_NUMBER() OVER (
                   PARTITION BY r.master_id
                   ORDER BY tc.track_count DESC, r.id ASC
               ) AS rn
        FROM release r
        JOIN release_track_count tc ON tc.release_id = r.id
        WHERE r.master_id IS NOT NULL
    ) ranked
    WHERE rn > 1
";

/// Same ranking as [`CREATE_DEDUP_CANDIDATES_FROM_SIDE_TABLE`], but counting
/// live from `release_track` instead. Fallback path for a store where the
/// side table is missing (e.g. a resumed run against an older export).
pub const CREATE_DEDUP_CANDIDATES_FROM_LIVE_COUNT: &str = "
    CREATE UNLOGGED TABLE dedup_delete_ids AS
    SELECT id AS release_id FROM (
        SELECT r.id, r.master_id,
               ROW_NUMBER() OVER (
                   PARTITION BY r.master_id
                   ORDER BY tc.track_count DESC, r.id ASC
               ) AS rn
        FROM release r
        JOIN (
            SELECT release_id, COUNT(*) AS track_count
            FROM release_track
            GROUP BY release_id
        ) tc ON tc.release_id = r.id
        WHERE r.master_id IS NOT NULL
    ) ranked
    WHERE rn > 1
";

pub const DEDUP_CANDIDATES_TABLE_EXISTS: &str = "
    SELECT EXISTS (
        SELECT FROM information_schema.tables WHERE table_name = 'dedup_delete_ids'
    )
";

pub const DEDUP_CANDIDATES_ADD_PRIMARY_KEY: &str = "ALTER TABLE dedup_delete_ids ADD PRIMARY KEY (release_id)";
pub const DEDUP_CANDIDATES_COUNT: &str = "SELECT count(*) FROM dedup_delete_ids";
pub const DEDUP_CANDIDATES_DROP: &str = "DROP TABLE IF EXISTS dedup_delete_ids";

/// `(table, new_table, projected_columns, release_id_column)` for the copy
/// stage, in processing order. Column lists are explicit, never `SELECT *`.
/// Only the three base tables: `release_track`/`release_track_artist` are
/// deferred to the `import_tracks` step that runs after dedup, so they hold
/// no rows yet and are not part of the copy-swap set.
pub const COPY_TABLE_SPECS: &[(&str, &str, &str, &str)] = &[
    ("release", "new_release", "id, title, release_year, artwork_url", "id"),
    ("release_artist", "new_release_artist", "release_id, artist_name, extra", "release_id"),
    ("cache_metadata", "new_cache_metadata", "release_id, cached_at, source, last_validated", "release_id"),
];

#[must_use]
pub fn copy_surviving_rows_sql(old_table: &str, new_table: &str, columns: &str, id_col: &str) -> String {
    format!(
        "CREATE TABLE {new_table} AS \
         SELECT {columns} FROM {old_table} t \
         WHERE NOT EXISTS (SELECT 1 FROM dedup_delete_ids d WHERE d.release_id = t.{id_col})"
    )
}

#[must_use]
pub fn drop_new_table_sql(new_table: &str) -> String {
    format!("DROP TABLE IF EXISTS {new_table}")
}

#[must_use]
pub fn row_count_sql(table: &str) -> String {
    format!("SELECT count(*) FROM {table}")
}

/// `(old_table, new_table)` swap order: rename old out of the way, rename
/// new into place, drop the renamed-out old table (`CASCADE` removes the FK
/// constraints that still reference it).
#[must_use]
pub fn swap_table_statements(old_table: &str, new_table: &str) -> [String; 3] {
    let bak = format!("{old_table}_old");
    [
        format!("ALTER TABLE {old_table} RENAME TO {bak}"),
        format!("ALTER TABLE {new_table} RENAME TO {old_table}"),
        format!("DROP TABLE {bak} CASCADE"),
    ]
}

/// Dropped before swapping, so that renaming `release` doesn't fail with a
/// dangling FK reference from a table not yet swapped itself.
pub const DROP_FK_CONSTRAINTS: &[&str] = &[
    "ALTER TABLE release_artist DROP CONSTRAINT IF EXISTS fk_release_artist_release",
    "ALTER TABLE release_track DROP CONSTRAINT IF EXISTS fk_release_track_release",
    "ALTER TABLE release_track_artist DROP CONSTRAINT IF EXISTS fk_release_track_artist_release",
    "ALTER TABLE cache_metadata DROP CONSTRAINT IF EXISTS fk_cache_metadata_release",
];

/// Re-applied, in order, to the swapped-in tables: primary keys, foreign
/// keys with `ON DELETE CASCADE`, FK-column indexes, then the trigram
/// indexes on `release`/`release_artist` (grounded on the same names the
/// base schema uses). `release_track`/`release_track_artist` only get their
/// FK constraint and FK-column index restored here — they hold no rows yet,
/// so their trigram indexes are left to the later `create_track_indexes`
/// step instead of being built over an empty table now.
pub const ADD_CONSTRAINTS_AND_INDEXES: &[&str] = &[
    "ALTER TABLE release ADD PRIMARY KEY (id)",
    "ALTER TABLE release_artist ADD CONSTRAINT fk_release_artist_release \
     FOREIGN KEY (release_id) REFERENCES release(id) ON DELETE CASCADE",
    "ALTER TABLE release_track ADD CONSTRAINT fk_release_track_release \
     FOREIGN KEY (release_id) REFERENCES release(id) ON DELETE CASCADE",
    "ALTER TABLE release_track_artist ADD CONSTRAINT fk_release_track_artist_release \
     FOREIGN KEY (release_id) REFERENCES release(id) ON DELETE CASCADE",
    "ALTER TABLE cache_metadata ADD CONSTRAINT fk_cache_metadata_release \
     FOREIGN KEY (release_id) REFERENCES release(id) ON DELETE CASCADE",
    "ALTER TABLE cache_metadata ADD PRIMARY KEY (release_id)",
    "CREATE INDEX idx_release_artist_release_id ON release_artist(release_id)",
    "CREATE INDEX idx_release_track_release_id ON release_track(release_id)",
    "CREATE INDEX idx_release_track_artist_release_id ON release_track_artist(release_id)",
    "CREATE INDEX idx_release_artist_name_trgm ON release_artist USING gin (lower(f_unaccent(artist_name)) gin_trgm_ops)",
    "CREATE INDEX idx_release_title_trgm ON release USING gin (lower(f_unaccent(title)) gin_trgm_ops)",
    "CREATE INDEX idx_cache_metadata_cached_at ON cache_metadata(cached_at)",
    "CREATE INDEX idx_cache_metadata_source ON cache_metadata(source)",
];
