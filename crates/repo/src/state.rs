// SPDX-License-Identifier: AGPL-3.0-or-later

//! Resumable pipeline state, persisted as a schema-versioned JSON file.
//!
//! The state file is the source of truth for which pipeline steps have
//! already run. It is written atomically (temp file + rename) so a crash
//! mid-write never corrupts the previous, still-valid state.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current on-disk schema version. Version 1 files are migrated on load.
pub const VERSION: u32 = 2;

/// The ordered steps of a pipeline run, in execution order. `dedup` runs
/// before `import_tracks`/`create_track_indexes`: track rows don't exist yet
/// at this point, so ranking releases within a `master_id` group is done off
/// the track-count side table built during `import_csv` (falling back to a
/// live count from `release_track` if that side table is absent). Importing
/// tracks afterward means only rows for surviving releases get written.
pub const STEP_NAMES: [StepName; 8] = [
    StepName::CreateSchema,
    StepName::ImportCsv,
    StepName::CreateIndexes,
    StepName::Dedup,
    StepName::ImportTracks,
    StepName::CreateTrackIndexes,
    StepName::Prune,
    StepName::Vacuum,
];

/// v1 state files only had these six steps; `import_tracks` and
/// `create_track_indexes` were split out of `import_csv`/`create_indexes` in
/// v2, as separate, independently-resumable steps.
const V1_STEP_NAMES: [StepName; 6] = [
    StepName::CreateSchema,
    StepName::ImportCsv,
    StepName::CreateIndexes,
    StepName::Dedup,
    StepName::Prune,
    StepName::Vacuum,
];

/// A single step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    CreateSchema,
    ImportCsv,
    CreateIndexes,
    Dedup,
    ImportTracks,
    CreateTrackIndexes,
    Prune,
    Vacuum,
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateSchema => "create_schema",
            Self::ImportCsv => "import_csv",
            Self::CreateIndexes => "create_indexes",
            Self::Dedup => "dedup",
            Self::ImportTracks => "import_tracks",
            Self::CreateTrackIndexes => "create_track_indexes",
            Self::Prune => "prune",
            Self::Vacuum => "vacuum",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StepStatus {
    Pending,
    Completed,
    Failed { error: String },
}

impl Default for StepStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    database_url: String,
    csv_dir: String,
    steps: std::collections::BTreeMap<StepName, StepStatus>,
}

/// Tracks step completion status across a resumable pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineState {
    db_url: String,
    csv_dir: String,
    steps: std::collections::BTreeMap<StepName, StepStatus>,
}

impl PipelineState {
    #[must_use]
    pub fn new(db_url: impl Into<String>, csv_dir: impl Into<String>) -> Self {
        let steps = STEP_NAMES.iter().map(|&step| (step, StepStatus::Pending)).collect();
        Self { db_url: db_url.into(), csv_dir: csv_dir.into(), steps }
    }

    #[must_use]
    pub fn db_url(&self) -> &str {
        &self.db_url
    }

    #[must_use]
    pub fn csv_dir(&self) -> &str {
        &self.csv_dir
    }

    #[must_use]
    pub fn is_completed(&self, step: StepName) -> bool {
        matches!(self.steps.get(&step), Some(StepStatus::Completed))
    }

    pub fn mark_completed(&mut self, step: StepName) {
        self.steps.insert(step, StepStatus::Completed);
    }

    pub fn mark_failed(&mut self, step: StepName, error: impl Into<String>) {
        self.steps.insert(step, StepStatus::Failed { error: error.into() });
    }

    #[must_use]
    pub fn step_status(&self, step: StepName) -> &StepStatus {
        self.steps.get(&step).unwrap_or(&StepStatus::Pending)
    }

    /// Returns an error if `db_url`/`csv_dir` don't match the values this
    /// state was created with — guards against accidentally resuming a run
    /// against the wrong database or CSV export.
    pub fn validate_resume(&self, db_url: &str, csv_dir: &str) -> Result<()> {
        if self.db_url != db_url {
            return Err(Error::StateMismatch {
                field: "database_url",
                expected: self.db_url.clone(),
                actual: db_url.to_string(),
            });
        }
        if self.csv_dir != csv_dir {
            return Err(Error::StateMismatch {
                field: "csv_dir",
                expected: self.csv_dir.clone(),
                actual: csv_dir.to_string(),
            });
        }
        Ok(())
    }

    /// Writes state to `path` atomically: serialize to a `.tmp` sibling file,
    /// then rename it over `path`. A crash between these two steps leaves
    /// the previous `path` untouched.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = StateFile {
            version: VERSION,
            database_url: self.db_url.clone(),
            csv_dir: self.csv_dir.clone(),
            steps: self.steps.clone(),
        };
        let mut json = serde_json::to_string_pretty(&data)?;
        json.push('\n');

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Loads state from `path`, migrating a v1 file to v2 in memory if needed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let raw: serde_json::Value = serde_json::from_str(&text)?;

        let version = raw.get("version").and_then(serde_json::Value::as_u64);
        match version {
            Some(1) => Ok(Self::migrate_v1(&raw)?),
            Some(v) if v == u64::from(VERSION) => {
                let data: StateFile = serde_json::from_value(raw)?;
                Ok(Self { db_url: data.database_url, csv_dir: data.csv_dir, steps: data.steps })
            }
            other => Err(Error::UnsupportedStateVersion { found: other, expected: VERSION }),
        }
    }

    /// Migrates a v1 state file (six steps) to the in-memory v2 representation.
    ///
    /// v2 splits track import out of `import_csv` and track-index creation
    /// out of `create_indexes`, so a completed v1 step implies its v2
    /// successor is also complete:
    /// - `import_csv` completed -> `import_tracks` completed (v1 imported
    ///   tracks as part of `import_csv`, before the split).
    /// - `create_indexes` completed OR `dedup` completed -> `create_track_indexes`
    ///   completed (v1 created all four trigram indexes in one step, and
    ///   `dedup` could not have run in v1 without that step already done).
    fn migrate_v1(raw: &serde_json::Value) -> Result<Self> {
        let database_url = raw
            .get("database_url")
            .and_then(serde_json::Value::as_str)
            .ok_or(Error::MalformedStateFile("missing database_url"))?
            .to_string();
        let csv_dir = raw
            .get("csv_dir")
            .and_then(serde_json::Value::as_str)
            .ok_or(Error::MalformedStateFile("missing csv_dir"))?
            .to_string();

        let mut state = Self::new(database_url, csv_dir);
        let v1_steps = raw.get("steps").cloned().unwrap_or(serde_json::Value::Null);

        let step_completed = |name: &str| -> bool {
            v1_steps.get(name).and_then(|s| s.get("status")).and_then(serde_json::Value::as_str) == Some("completed")
        };

        for &step in &V1_STEP_NAMES {
            if step_completed(&step.to_string()) {
                state.mark_completed(step);
            }
        }

        if step_completed("import_csv") {
            state.mark_completed(StepName::ImportTracks);
        }
        if step_completed("create_indexes") || step_completed("dedup") {
            state.mark_completed(StepName::CreateTrackIndexes);
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{PipelineState, StepName};

    #[test]
    fn new_state_has_all_steps_pending() {
        let state = PipelineState::new("postgresql:///discogs", "/data/csv");
        assert!(!state.is_completed(StepName::CreateSchema));
        assert!(!state.is_completed(StepName::Vacuum));
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        let mut state = PipelineState::new("postgresql:///discogs", "/data/csv");
        state.mark_completed(StepName::CreateSchema);
        state.mark_completed(StepName::ImportCsv);
        state.save(&path).expect("save");

        let loaded = PipelineState::load(&path).expect("load");
        assert!(loaded.is_completed(StepName::CreateSchema));
        assert!(loaded.is_completed(StepName::ImportCsv));
        assert!(!loaded.is_completed(StepName::Dedup));
        assert_eq!(loaded.db_url(), "postgresql:///discogs");
    }

    #[test]
    fn save_is_atomic_no_tmp_file_left_behind() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        let state = PipelineState::new("postgresql:///discogs", "/data/csv");
        state.save(&path).expect("save");
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn migrates_v1_import_csv_completed_implies_import_tracks() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{
                "version": 1,
                "database_url": "postgresql:///discogs",
                "csv_dir": "/data/csv",
                "steps": {
                    "create_schema": {"status": "completed"},
                    "import_csv": {"status": "completed"},
                    "create_indexes": {"status": "pending"},
                    "dedup": {"status": "pending"},
                    "prune": {"status": "pending"},
                    "vacuum": {"status": "pending"}
                }
            }"#,
        )
        .expect("write v1 state");

        let state = PipelineState::load(&path).expect("load v1 state");
        assert!(state.is_completed(StepName::ImportCsv));
        assert!(state.is_completed(StepName::ImportTracks));
        assert!(!state.is_completed(StepName::CreateTrackIndexes));
    }

    #[test]
    fn migrates_v1_dedup_completed_implies_create_track_indexes() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        std::fs::write(
            &path,
            r#"{
                "version": 1,
                "database_url": "postgresql:///discogs",
                "csv_dir": "/data/csv",
                "steps": {
                    "dedup": {"status": "completed"}
                }
            }"#,
        )
        .expect("write v1 state");

        let state = PipelineState::load(&path).expect("load v1 state");
        assert!(state.is_completed(StepName::CreateTrackIndexes));
    }

    #[test]
    fn rejects_mismatched_resume_target() {
        let state = PipelineState::new("postgresql:///discogs", "/data/csv");
        assert!(state.validate_resume("postgresql:///other", "/data/csv").is_err());
    }
}
