// SPDX-License-Identifier: AGPL-3.0-or-later

//! Persistence for previously confirmed artist-level KEEP/PRUNE decisions,
//! so REVIEW items resolved by a human auto-resolve on subsequent runs.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// `{"keep": {discogs_artist: library_artist}, "prune": {discogs_artist: null}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtistMappingsFile {
    #[serde(default)]
    pub keep: HashMap<String, Option<String>>,
    #[serde(default)]
    pub prune: HashMap<String, Option<String>>,
}

/// Loads artist mappings from `path`, returning empty mappings if the file
/// does not exist yet (the common case on a project's first run).
pub fn load(path: &Path) -> Result<ArtistMappingsFile> {
    if !path.exists() {
        return Ok(ArtistMappingsFile::default());
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Saves artist mappings to `path` as pretty-printed JSON.
pub fn save(path: &Path, mappings: &ArtistMappingsFile) -> Result<()> {
    let mut json = serde_json::to_string_pretty(mappings)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

impl From<ArtistMappingsFile> for catcache_core::matcher::ArtistMappings {
    fn from(file: ArtistMappingsFile) -> Self {
        Self { keep: file.keep, prune: file.prune }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{load, save, ArtistMappingsFile};

    #[test]
    fn missing_file_loads_empty_mappings() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("artist_mappings.json");
        let mappings = load(&path).expect("load");
        assert!(mappings.keep.is_empty());
        assert!(mappings.prune.is_empty());
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("artist_mappings.json");

        let mut mappings = ArtistMappingsFile::default();
        mappings.keep.insert("joy division".to_string(), Some("joy division".to_string()));
        mappings.prune.insert("some noise artist".to_string(), None);
        save(&path, &mappings).expect("save");

        let loaded = load(&path).expect("load");
        assert_eq!(loaded.keep.get("joy division"), Some(&Some("joy division".to_string())));
        assert!(loaded.prune.contains_key("some noise artist"));
    }
}
