// SPDX-License-Identifier: AGPL-3.0-or-later

//! Loading the library catalog into a [`LibraryIndex`].

use std::path::Path;

use catcache_core::index::LibraryIndex;

use crate::error::{Error, Result};

/// Reads a library catalog CSV (header row with at least `artist_name` and
/// `release_title` columns — the same shape the labels-preference export
/// uses, minus `label_name`) into the `(raw artist, raw title)` pairs
/// [`LibraryIndex::from_rows`] expects.
pub fn load_library_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path).map_err(|err| {
        Error::Other(anyhow::Error::from(err))
    })?;
    let header = reader.headers().map_err(|err| Error::Other(anyhow::Error::from(err)))?.clone();

    let artist_idx = header
        .iter()
        .position(|h| h == "artist_name")
        .ok_or_else(|| Error::Config("library catalog CSV missing artist_name column".to_string()))?;
    let title_idx = header
        .iter()
        .position(|h| h == "release_title")
        .ok_or_else(|| Error::Config("library catalog CSV missing release_title column".to_string()))?;

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| Error::Other(anyhow::Error::from(err)))?;
        let artist = record.get(artist_idx).unwrap_or_default();
        let title = record.get(title_idx).unwrap_or_default();
        if artist.is_empty() || title.is_empty() {
            continue;
        }
        pairs.push((artist.to_string(), title.to_string()));
    }
    Ok(pairs)
}

/// Builds the immutable [`LibraryIndex`] from a library catalog CSV.
pub fn build_library_index(path: &Path) -> Result<LibraryIndex> {
    let pairs = load_library_pairs(path)?;
    Ok(LibraryIndex::from_rows(pairs))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::load_library_pairs;

    #[test]
    fn skips_rows_with_empty_artist_or_title() {
        let mut file = NamedTempFile::new().expect("tempfile");
        writeln!(file, "artist_name,release_title,label_name").unwrap();
        writeln!(file, "Joy Division,Closer,Factory").unwrap();
        writeln!(file, ",Closer,Factory").unwrap();
        writeln!(file, "Joy Division,,Factory").unwrap();
        file.flush().unwrap();

        let pairs = load_library_pairs(file.path()).expect("load");
        assert_eq!(pairs, vec![("Joy Division".to_string(), "Closer".to_string())]);
    }
}
