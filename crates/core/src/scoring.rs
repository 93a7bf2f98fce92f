// SPDX-License-Identifier: AGPL-3.0-or-later

//! The four independent similarity scorers used to classify a catalog
//! release against the library index. Each returns a score in `[0.0, 1.0]`.

use crate::fuzzy::{best_match, token_set_ratio, token_sort_ratio};
use crate::index::{LibraryIndex, COMBINED_SEPARATOR};

/// Minimum artist-name similarity (on the `[0.0, 1.0]` scale) required before
/// [`score_two_stage`] will even attempt a title match against that artist.
pub const DEFAULT_ARTIST_THRESHOLD: f64 = 0.70;

/// Returns `1.0` if the exact `(artist, title)` pair is in the index, `0.0` otherwise.
#[must_use]
pub fn score_exact(norm_artist: &str, norm_title: &str, index: &LibraryIndex) -> f64 {
    f64::from(u8::from(index.contains_pair(norm_artist, norm_title)))
}

/// Scores using `token_set_ratio` on the combined `"artist ||| title"` string
/// against every combined string in the index, returning the best match.
#[must_use]
pub fn score_token_set(norm_artist: &str, norm_title: &str, index: &LibraryIndex) -> f64 {
    let query = format!("{norm_artist}{COMBINED_SEPARATOR}{norm_title}");
    best_match(&query, index.combined_strings(), token_set_ratio, None)
        .map_or(0.0, |(_, _, score)| score)
}

/// Scores using `token_sort_ratio` on the combined `"artist ||| title"`
/// string. More sensitive to word order than [`score_token_set`].
#[must_use]
pub fn score_token_sort(norm_artist: &str, norm_title: &str, index: &LibraryIndex) -> f64 {
    let query = format!("{norm_artist}{COMBINED_SEPARATOR}{norm_title}");
    best_match(&query, index.combined_strings(), token_sort_ratio, None)
        .map_or(0.0, |(_, _, score)| score)
}

/// Two-stage scorer: first matches the artist, then matches the title within
/// that artist's known titles, and returns the geometric mean of the two
/// scores. Most precise of the four scorers because it keeps the artist and
/// title dimensions separate, preventing a strong title match from
/// compensating for an unrelated artist.
#[must_use]
pub fn score_two_stage(norm_artist: &str, norm_title: &str, index: &LibraryIndex) -> f64 {
    score_two_stage_with_threshold(norm_artist, norm_title, index, DEFAULT_ARTIST_THRESHOLD)
}

#[must_use]
pub fn score_two_stage_with_threshold(
    norm_artist: &str,
    norm_title: &str,
    index: &LibraryIndex,
    artist_threshold: f64,
) -> f64 {
    if index.all_artists().is_empty() {
        return 0.0;
    }

    let Some((_, matched_artist, artist_score)) =
        best_match(norm_artist, index.all_artists(), token_set_ratio, Some(artist_threshold))
    else {
        return 0.0;
    };

    let Some(titles) = index.titles_for_artist(matched_artist) else {
        return 0.0;
    };
    if titles.is_empty() {
        return 0.0;
    }

    let Some((_, _, title_score)) = best_match(norm_title, titles, token_set_ratio, None) else {
        return 0.0;
    };

    (artist_score * title_score).sqrt()
}

#[cfg(test)]
mod tests {
    use super::{score_exact, score_token_set, score_two_stage};
    use crate::index::LibraryIndex;

    fn sample_index() -> LibraryIndex {
        LibraryIndex::from_rows([
            ("Joy Division", "Unknown Pleasures"),
            ("Joy Division", "Closer"),
            ("Boards of Canada", "Music Has the Right to Children"),
        ])
    }

    #[test]
    fn exact_match_scores_one() {
        let index = sample_index();
        assert_eq!(score_exact("joy division", "closer", &index), 1.0);
        assert_eq!(score_exact("joy division", "power corruption lies", &index), 0.0);
    }

    #[test]
    fn token_set_scores_close_variant_highly() {
        let index = sample_index();
        let score = score_token_set("joy division", "unknown pleasure", &index);
        assert!(score > 0.85, "expected high score, got {score}");
    }

    #[test]
    fn two_stage_rejects_unrelated_artist() {
        let index = sample_index();
        let score = score_two_stage("some completely unrelated band", "completely unrelated album", &index);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn two_stage_matches_known_artist_new_title() {
        let index = sample_index();
        let score = score_two_stage("joy division", "closer", &index);
        assert!(score > 0.9, "expected high score, got {score}");
    }
}
