// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-memory index over the smaller library catalog, built once and then
//! queried many times while classifying catalog releases.

use std::collections::{HashMap, HashSet};

use crate::matching::is_compilation_artist;
use crate::normalize::{normalize_artist, normalize_title};

/// Separator used when combining an artist and a title into one string for
/// the combined-string scorers.
pub const COMBINED_SEPARATOR: &str = " ||| ";

/// Pre-built, immutable index of library `(artist, title)` pairs.
///
/// Built once per pipeline run via [`LibraryIndex::from_rows`] and shared
/// (read-only) across all classification work.
#[derive(Debug, Clone)]
pub struct LibraryIndex {
    /// `(normalized_artist, normalized_title)` pairs, for O(1) exact lookup.
    exact_pairs: HashSet<(String, String)>,
    /// Normalized artist -> normalized titles known for that artist.
    artist_to_titles: HashMap<String, Vec<String>>,
    /// `"artist ||| title"` strings, for the combined-string scorers.
    combined_strings: Vec<String>,
    /// Deduplicated, sorted normalized artist names (excludes compilations).
    all_artists: Vec<String>,
    /// Normalized titles seen under a compilation/various-artists credit.
    compilation_titles: HashSet<String>,
}

impl LibraryIndex {
    /// Builds an index from raw `(artist, title)` pairs as read from the
    /// library catalog. Rows with an empty artist or title are skipped;
    /// rows credited to a compilation artist are routed into
    /// `compilation_titles` instead of the per-artist index.
    #[must_use]
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut exact_pairs = HashSet::new();
        let mut artist_to_titles: HashMap<String, HashSet<String>> = HashMap::new();
        let mut combined_strings = Vec::new();
        let mut artist_set = HashSet::new();
        let mut compilation_titles = HashSet::new();

        for (raw_artist, raw_title) in rows {
            let raw_artist = raw_artist.as_ref();
            let raw_title = raw_title.as_ref();
            if raw_artist.is_empty() || raw_title.is_empty() {
                continue;
            }

            let norm_title = normalize_title(raw_title);

            if is_compilation_artist(raw_artist) {
                compilation_titles.insert(norm_title);
                continue;
            }

            let norm_artist = normalize_artist(raw_artist);
            let pair = (norm_artist.clone(), norm_title.clone());

            if !exact_pairs.insert(pair) {
                continue; // already present, deduplicate
            }

            artist_to_titles
                .entry(norm_artist.clone())
                .or_default()
                .insert(norm_title.clone());
            artist_set.insert(norm_artist.clone());

            combined_strings.push(format!("{norm_artist}{COMBINED_SEPARATOR}{norm_title}"));
        }

        let artist_to_titles = artist_to_titles
            .into_iter()
            .map(|(artist, titles)| (artist, titles.into_iter().collect::<Vec<_>>()))
            .collect();

        let mut all_artists: Vec<String> = artist_set.into_iter().collect();
        all_artists.sort_unstable();

        Self {
            exact_pairs,
            artist_to_titles,
            combined_strings,
            all_artists,
            compilation_titles,
        }
    }

    /// Number of distinct `(artist, title)` pairs in the index.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.exact_pairs.len()
    }

    /// Number of distinct non-compilation artists in the index.
    #[must_use]
    pub fn artist_count(&self) -> usize {
        self.all_artists.len()
    }

    /// Number of distinct compilation titles in the index.
    #[must_use]
    pub fn compilation_title_count(&self) -> usize {
        self.compilation_titles.len()
    }

    #[must_use]
    pub fn contains_pair(&self, norm_artist: &str, norm_title: &str) -> bool {
        self.exact_pairs
            .contains(&(norm_artist.to_string(), norm_title.to_string()))
    }

    #[must_use]
    pub fn contains_artist(&self, norm_artist: &str) -> bool {
        self.artist_to_titles.contains_key(norm_artist)
    }

    #[must_use]
    pub fn titles_for_artist(&self, norm_artist: &str) -> Option<&[String]> {
        self.artist_to_titles.get(norm_artist).map(Vec::as_slice)
    }

    #[must_use]
    pub fn all_artists(&self) -> &[String] {
        &self.all_artists
    }

    #[must_use]
    pub fn combined_strings(&self) -> &[String] {
        &self.combined_strings
    }

    #[must_use]
    pub fn contains_compilation_title(&self, norm_title: &str) -> bool {
        self.compilation_titles.contains(norm_title)
    }

    #[must_use]
    pub fn compilation_titles(&self) -> impl Iterator<Item = &str> {
        self.compilation_titles.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::LibraryIndex;

    #[test]
    fn builds_exact_pairs_and_artists() {
        let index = LibraryIndex::from_rows([
            ("Joy Division", "Unknown Pleasures"),
            ("Joy Division", "Closer"),
            ("Boards of Canada", "Music Has the Right to Children"),
        ]);
        assert_eq!(index.pair_count(), 3);
        assert_eq!(index.artist_count(), 2);
        assert!(index.contains_pair("joy division", "unknown pleasures"));
        assert!(index.contains_artist("joy division"));
    }

    #[test]
    fn routes_compilations_separately() {
        let index = LibraryIndex::from_rows([("Various Artists", "Now That's What I Call Music")]);
        assert_eq!(index.artist_count(), 0);
        assert_eq!(index.compilation_title_count(), 1);
        assert!(index.contains_compilation_title("now that's what i call music"));
    }

    #[test]
    fn deduplicates_identical_pairs() {
        let index = LibraryIndex::from_rows([("Beatles, The", "Abbey Road"), ("The Beatles", "Abbey Road")]);
        assert_eq!(index.pair_count(), 1);
    }

    #[test]
    fn skips_rows_with_empty_fields() {
        let index = LibraryIndex::from_rows([("", "Abbey Road"), ("The Beatles", "")]);
        assert_eq!(index.pair_count(), 0);
    }
}
