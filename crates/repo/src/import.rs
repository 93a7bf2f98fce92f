// SPDX-License-Identifier: AGPL-3.0-or-later

//! Bulk CSV import: column projection, required-column filtering, and
//! in-process uniqueness dedup, shared by every storage backend.
//!
//! The actual bulk write (`COPY ... FROM STDIN` or equivalent) is
//! storage-specific and lives behind the [`BulkImporter`] trait.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{Error, Result};

/// A column transform applied after projection, before the required-column
/// null check (so a transform that turns a value into `None` still causes
/// the row to be skipped if that column is required).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    /// Extracts a four-digit year from the start of the value.
    ExtractYear,
}

impl Transform {
    fn apply(self, value: Option<&str>) -> Option<String> {
        match self {
            Self::Identity => value.map(str::to_string),
            Self::ExtractYear => catcache_core::normalize::extract_year(value).map(|y| y.to_string()),
        }
    }
}

/// One CSV column to project into the target table.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub csv_name: &'static str,
    pub db_name: &'static str,
    pub transform: Transform,
    pub required: bool,
}

impl ColumnSpec {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { csv_name: name, db_name: name, transform: Transform::Identity, required: false }
    }

    #[must_use]
    pub const fn renamed(csv_name: &'static str, db_name: &'static str) -> Self {
        Self { csv_name, db_name, transform: Transform::Identity, required: false }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn transformed(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Describes how to project one CSV file into one table.
#[derive(Debug, Clone, Copy)]
pub struct TableImportSpec {
    pub csv_file: &'static str,
    pub table: &'static str,
    pub columns: &'static [ColumnSpec],
    /// CSV column names that, taken together, must be unique; rows repeating
    /// a previously seen key are dropped, keeping the first occurrence.
    /// Empty means no dedup.
    pub unique_key: &'static [&'static str],
}

/// The release-level tables imported during the `import_csv` step.
/// `release_label`/`release_genre`/`release_style` and the standalone
/// `artist` table are dropped by the optimized schema and are never
/// imported. Track-level rows live in [`TRACK_IMPORT_TABLES`] instead,
/// imported by the separate `import_tracks` step, which runs *after*
/// `dedup` — only releases that survive dedup get their tracks imported.
pub const RELEASE_IMPORT_TABLES: &[TableImportSpec] = &[
    TableImportSpec {
        csv_file: "release.csv",
        table: "release",
        columns: &[
            ColumnSpec::new("id").required(),
            ColumnSpec::new("title").required(),
            ColumnSpec::renamed("released", "release_year").transformed(Transform::ExtractYear),
            ColumnSpec::new("master_id"),
        ],
        unique_key: &[],
    },
    TableImportSpec {
        csv_file: "release_artist.csv",
        table: "release_artist",
        columns: &[ColumnSpec::new("release_id").required(), ColumnSpec::new("artist_name"), ColumnSpec::new("extra")],
        unique_key: &["release_id", "artist_name"],
    },
];

/// The two track-level tables, imported by the `import_tracks` step, which
/// runs after `dedup` so that only surviving releases' tracks get written.
pub const TRACK_IMPORT_TABLES: &[TableImportSpec] = &[
    TableImportSpec {
        csv_file: "release_track.csv",
        table: "release_track",
        columns: &[
            ColumnSpec::new("release_id").required(),
            ColumnSpec::new("sequence"),
            ColumnSpec::new("position"),
            ColumnSpec::new("title").required(),
            ColumnSpec::new("duration"),
        ],
        unique_key: &[],
    },
    TableImportSpec {
        csv_file: "release_track_artist.csv",
        table: "release_track_artist",
        columns: &[
            ColumnSpec::new("release_id").required(),
            ColumnSpec::new("track_sequence").required(),
            ColumnSpec::new("artist_name"),
        ],
        unique_key: &["release_id", "track_sequence", "artist_name"],
    },
];

/// One row, projected to the target table's columns in `db_name` order.
pub type ProjectedRow = Vec<Option<String>>;

/// Counts describing how a CSV file was imported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped_null_required: usize,
    pub skipped_duplicate: usize,
}

/// Reads `csv_path`, projects each row onto `spec`'s columns, applies
/// transforms, drops rows missing a required column (checked *after*
/// transform, since a transform like [`Transform::ExtractYear`] can turn a
/// present value into `None`), and deduplicates by `spec.unique_key` keeping
/// the first occurrence.
pub fn project_csv_rows(spec: &TableImportSpec, csv_path: &Path) -> Result<(Vec<ProjectedRow>, ImportOutcome)> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(csv_path)?;
    let header = reader.headers()?.clone();

    let mut csv_indices = Vec::with_capacity(spec.columns.len());
    for column in spec.columns {
        let index = header
            .iter()
            .position(|h| h == column.csv_name)
            .ok_or(Error::MalformedStateFile("CSV header missing expected column"))?;
        csv_indices.push(index);
    }

    let unique_key_positions: Vec<usize> = spec
        .unique_key
        .iter()
        .map(|key| spec.columns.iter().position(|c| c.csv_name == *key).expect("unique_key references a projected column"))
        .collect();

    let mut rows = Vec::new();
    let mut outcome = ImportOutcome::default();
    let mut seen: HashSet<ProjectedRow> = HashSet::new();

    for record in reader.records() {
        let record = record?;
        let mut values = Vec::with_capacity(spec.columns.len());
        let mut skip = false;

        for (column, &csv_index) in spec.columns.iter().zip(&csv_indices) {
            let raw = record.get(csv_index).filter(|v| !v.is_empty());
            let value = column.transform.apply(raw);
            if column.required && value.is_none() {
                skip = true;
                break;
            }
            values.push(value);
        }

        if skip {
            outcome.skipped_null_required += 1;
            continue;
        }

        if !unique_key_positions.is_empty() {
            let key: ProjectedRow = unique_key_positions.iter().map(|&i| values[i].clone()).collect();
            if !seen.insert(key) {
                outcome.skipped_duplicate += 1;
                continue;
            }
        }

        outcome.imported += 1;
        rows.push(values);
    }

    Ok((rows, outcome))
}

/// Counts `release_id` occurrences in `release_track.csv`, without
/// projecting or importing the track rows themselves. Feeds the track-count
/// side table built during `import_csv`, consumed by dedup's ranking query
/// once it runs — tracks themselves aren't imported until after dedup.
pub fn count_track_occurrences(csv_path: &Path) -> Result<Vec<(i64, i64)>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(csv_path)?;
    let header = reader.headers()?.clone();
    let release_id_idx =
        header.iter().position(|h| h == "release_id").ok_or(Error::MalformedStateFile("CSV header missing release_id"))?;

    let mut counts: std::collections::HashMap<i64, i64> = std::collections::HashMap::new();
    for record in reader.records() {
        let record = record?;
        let Some(release_id) = record.get(release_id_idx).filter(|v| !v.is_empty()) else { continue };
        let Ok(release_id) = release_id.parse::<i64>() else { continue };
        *counts.entry(release_id).or_insert(0) += 1;
    }

    Ok(counts.into_iter().collect())
}

/// Storage-specific bulk write of projected CSV rows and release artwork,
/// plus `cache_metadata` population.
pub trait BulkImporter {
    /// Bulk-inserts `rows` (already projected per [`project_csv_rows`]) into `spec.table`.
    fn write_rows(&mut self, spec: &TableImportSpec, rows: &[ProjectedRow]) -> Result<()>;

    /// Populates `release.artwork_url` from a `release_image.csv` export,
    /// preferring the `primary`-typed image and falling back to the first
    /// image seen for a release.
    fn import_artwork(&mut self, csv_dir: &Path) -> Result<usize>;

    /// Seeds `cache_metadata` rows for every release lacking one.
    fn populate_cache_metadata(&mut self, source: &str) -> Result<usize>;

    /// Builds the transient track-count side table from `counts` (as
    /// returned by [`count_track_occurrences`]), replacing any existing
    /// contents. Returns the number of releases counted.
    fn write_track_count_side_table(&mut self, counts: &[(i64, i64)]) -> Result<u64>;

    /// Like [`BulkImporter::write_rows`], but only inserts rows whose
    /// `release_id` column still has a matching row in `release` — i.e.,
    /// rows for releases that survived dedup. Returns the number of rows
    /// actually inserted.
    fn write_track_rows(&mut self, spec: &TableImportSpec, rows: &[ProjectedRow]) -> Result<u64>;
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::{count_track_occurrences, project_csv_rows, RELEASE_IMPORT_TABLES};

    #[test]
    fn projects_required_columns_and_extracts_year() {
        let mut file = NamedTempFile::new().expect("tempfile");
        writeln!(file, "id,title,released,master_id").unwrap();
        writeln!(file, "1,Abbey Road,1969-09-26,100").unwrap();
        writeln!(file, "2,,1970-01-01,101").unwrap(); // missing required title
        file.flush().unwrap();

        let spec = &RELEASE_IMPORT_TABLES[0];
        let (rows, outcome) = project_csv_rows(spec, file.path()).expect("project");

        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped_null_required, 1);
        assert_eq!(rows[0], vec![Some("1".to_string()), Some("Abbey Road".to_string()), Some("1969".to_string()), Some("100".to_string())]);
    }

    #[test]
    fn dedups_by_unique_key_keeping_first() {
        let mut file = NamedTempFile::new().expect("tempfile");
        writeln!(file, "release_id,artist_name,extra").unwrap();
        writeln!(file, "1,Joy Division,0").unwrap();
        writeln!(file, "1,Joy Division,0").unwrap();
        writeln!(file, "1,Peter Hook,1").unwrap();
        file.flush().unwrap();

        let spec = &RELEASE_IMPORT_TABLES[1];
        let (rows, outcome) = project_csv_rows(spec, file.path()).expect("project");

        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.skipped_duplicate, 1);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn counts_track_occurrences_per_release() {
        let mut file = NamedTempFile::new().expect("tempfile");
        writeln!(file, "release_id,sequence,position,title,duration").unwrap();
        writeln!(file, "1,1,A1,Come Together,4:19").unwrap();
        writeln!(file, "1,2,A2,Something,3:02").unwrap();
        writeln!(file, "2,1,A1,Disorder,3:29").unwrap();
        file.flush().unwrap();

        let mut counts = count_track_occurrences(file.path()).expect("count");
        counts.sort_unstable();
        assert_eq!(counts, vec![(1, 2), (2, 1)]);
    }
}
