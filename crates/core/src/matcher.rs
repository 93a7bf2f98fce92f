// SPDX-License-Identifier: AGPL-3.0-or-later

//! Multi-scorer agreement: classifies a single `(artist, title)` pair as
//! [`Decision::Keep`], [`Decision::Prune`] or [`Decision::Review`].

use std::collections::HashMap;

use crate::fuzzy::{best_match, token_set_ratio};
use crate::index::LibraryIndex;
use crate::scoring::{score_exact, score_token_set, score_token_sort, score_two_stage_with_threshold};

/// Classification outcome for a catalog release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The release matches a library `(artist, title)` pair.
    Keep,
    /// The release has no plausible library match; safe to prune.
    Prune,
    /// Ambiguous; requires human confirmation before pruning or keeping.
    Review,
}

/// The four scorer outputs behind a single classification, kept for
/// reporting (e.g. ranking [`Decision::Review`] items by how close they came).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub decision: Decision,
    pub exact_score: f64,
    pub token_set_score: f64,
    pub token_sort_score: f64,
    pub two_stage_score: f64,
}

impl MatchResult {
    #[must_use]
    pub fn max_fuzzy_score(&self) -> f64 {
        self.token_set_score.max(self.token_sort_score).max(self.two_stage_score)
    }
}

/// Previously confirmed per-artist decisions, keyed by normalized artist
/// name, that short-circuit scoring on subsequent pipeline runs.
#[derive(Debug, Clone, Default)]
pub struct ArtistMappings {
    pub keep: HashMap<String, Option<String>>,
    pub prune: HashMap<String, Option<String>>,
}

/// Decision thresholds for [`MultiIndexMatcher`]. All thresholds live on the
/// `[0.0, 1.0]` scale shared by every scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherConfig {
    /// 2-of-3 fuzzy scorers at or above this score -> [`Decision::Keep`].
    pub keep_threshold: f64,
    /// Combined with `moderate_threshold` for the "1 high + 1 moderate" rule.
    pub high_threshold: f64,
    pub moderate_threshold: f64,
    /// Below this, a release with no agreeing scorers is pruned outright.
    pub review_threshold: f64,
    /// Minimum artist similarity before [`crate::scoring::score_two_stage`] attempts a title match.
    pub artist_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            keep_threshold: 0.75,
            high_threshold: 0.85,
            moderate_threshold: 0.70,
            review_threshold: 0.65,
            artist_threshold: 0.70,
        }
    }
}

/// Classifies `(artist, title)` pairs by requiring agreement between the
/// three fuzzy scorers, with [`crate::scoring::score_two_stage`] required to participate in
/// any [`Decision::Keep`] — this is the anti-false-positive rule: it prevents
/// `token_set`/`token_sort` from both matching on a partial artist-name
/// overlap (e.g. `"Joy"` inside `"Joy Division"`) without a genuine
/// artist-level match backing it up.
#[derive(Debug, Clone)]
pub struct MultiIndexMatcher<'idx> {
    index: &'idx LibraryIndex,
    artist_mappings: ArtistMappings,
    config: MatcherConfig,
}

impl<'idx> MultiIndexMatcher<'idx> {
    #[must_use]
    pub fn new(index: &'idx LibraryIndex, artist_mappings: ArtistMappings, config: MatcherConfig) -> Self {
        Self { index, artist_mappings, config }
    }

    #[must_use]
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    #[must_use]
    pub fn artist_mappings(&self) -> &ArtistMappings {
        &self.artist_mappings
    }

    /// Fast path used once an artist is already known to be in the library
    /// (exact match or a confirmed mapping): skips the combined-string
    /// scorers and the artist-lookup stage of the two-stage scorer, doing
    /// only an exact pair check plus a direct title match within the
    /// artist's known titles. O(artist's titles) instead of O(all pairs).
    #[must_use]
    pub fn classify_known_artist(&self, norm_artist: &str, norm_title: &str) -> MatchResult {
        if self.index.contains_pair(norm_artist, norm_title) {
            return MatchResult {
                decision: Decision::Keep,
                exact_score: 1.0,
                token_set_score: 1.0,
                token_sort_score: 1.0,
                two_stage_score: 1.0,
            };
        }

        let Some(titles) = self.index.titles_for_artist(norm_artist) else {
            return MatchResult { decision: Decision::Prune, exact_score: 0.0, token_set_score: 0.0, token_sort_score: 0.0, two_stage_score: 0.0 };
        };

        let title_score = best_match(norm_title, titles, token_set_ratio, None).map_or(0.0, |(_, _, score)| score);

        let decision = if title_score >= self.config.keep_threshold {
            Decision::Keep
        } else if title_score >= self.config.review_threshold {
            Decision::Review
        } else {
            Decision::Prune
        };

        MatchResult { decision, exact_score: 0.0, token_set_score: 0.0, token_sort_score: 0.0, two_stage_score: title_score }
    }

    /// Full multi-scorer classification of a normalized `(artist, title)` pair.
    #[must_use]
    pub fn classify(&self, norm_artist: &str, norm_title: &str) -> MatchResult {
        if self.artist_mappings.keep.contains_key(norm_artist) {
            return MatchResult { decision: Decision::Keep, exact_score: 0.0, token_set_score: 0.0, token_sort_score: 0.0, two_stage_score: 0.0 };
        }
        if self.artist_mappings.prune.contains_key(norm_artist) {
            return MatchResult { decision: Decision::Prune, exact_score: 0.0, token_set_score: 0.0, token_sort_score: 0.0, two_stage_score: 0.0 };
        }

        let exact = score_exact(norm_artist, norm_title, self.index);
        if exact == 1.0 {
            return MatchResult { decision: Decision::Keep, exact_score: 1.0, token_set_score: 1.0, token_sort_score: 1.0, two_stage_score: 1.0 };
        }

        let token_set = score_token_set(norm_artist, norm_title, self.index);
        let token_sort = score_token_sort(norm_artist, norm_title, self.index);
        let two_stage =
            score_two_stage_with_threshold(norm_artist, norm_title, self.index, self.config.artist_threshold);

        let scores = [token_set, token_sort, two_stage];

        // 2-of-3 above keep_threshold, but two_stage must be one of the agreeing
        // scorers (see struct docs for why).
        let above_keep = scores.iter().filter(|s| **s >= self.config.keep_threshold).count();
        if above_keep >= 2 && two_stage >= self.config.keep_threshold {
            return MatchResult { decision: Decision::Keep, exact_score: exact, token_set_score: token_set, token_sort_score: token_sort, two_stage_score: two_stage };
        }

        // 1 scorer high + at least 1 other moderate, two_stage must participate.
        let has_high = scores.iter().any(|s| *s >= self.config.high_threshold);
        let above_moderate = scores.iter().filter(|s| **s >= self.config.moderate_threshold).count();
        if has_high && above_moderate >= 2 && two_stage >= self.config.moderate_threshold {
            return MatchResult { decision: Decision::Keep, exact_score: exact, token_set_score: token_set, token_sort_score: token_sort, two_stage_score: two_stage };
        }

        let max_score = scores.iter().copied().fold(0.0_f64, f64::max);
        let decision = if max_score >= self.config.review_threshold { Decision::Review } else { Decision::Prune };

        MatchResult { decision, exact_score: exact, token_set_score: token_set, token_sort_score: token_sort, two_stage_score: two_stage }
    }
}

/// Classifies a compilation release by title-only matching against the
/// index's known compilation titles (compilations cannot be matched by
/// artist, since the credited "artist" is something like "Various").
#[must_use]
pub fn classify_compilation(norm_title: &str, index: &LibraryIndex, threshold: f64) -> Decision {
    if index.compilation_title_count() == 0 {
        return Decision::Prune;
    }
    if index.contains_compilation_title(norm_title) {
        return Decision::Keep;
    }
    let titles: Vec<&str> = index.compilation_titles().collect();
    match best_match(norm_title, &titles, token_set_ratio, Some(threshold)) {
        Some(_) => Decision::Keep,
        None => Decision::Prune,
    }
}

#[cfg(test)]
mod tests {
    use super::{ArtistMappings, Decision, MatcherConfig, MultiIndexMatcher};
    use crate::index::LibraryIndex;

    fn sample_index() -> LibraryIndex {
        LibraryIndex::from_rows([
            ("Joy Division", "Unknown Pleasures"),
            ("Joy Division", "Closer"),
            ("Boards of Canada", "Music Has the Right to Children"),
        ])
    }

    #[test]
    fn exact_pair_is_kept() {
        let index = sample_index();
        let matcher = MultiIndexMatcher::new(&index, ArtistMappings::default(), MatcherConfig::default());
        let result = matcher.classify("joy division", "closer");
        assert_eq!(result.decision, Decision::Keep);
    }

    #[test]
    fn unrelated_pair_is_pruned() {
        let index = sample_index();
        let matcher = MultiIndexMatcher::new(&index, ArtistMappings::default(), MatcherConfig::default());
        let result = matcher.classify("totally unrelated band", "totally unrelated album");
        assert_eq!(result.decision, Decision::Prune);
    }

    #[test]
    fn artist_mapping_short_circuits_prune() {
        let index = sample_index();
        let mut mappings = ArtistMappings::default();
        mappings.prune.insert("some artist".to_string(), None);
        let matcher = MultiIndexMatcher::new(&index, mappings, MatcherConfig::default());
        let result = matcher.classify("some artist", "some album");
        assert_eq!(result.decision, Decision::Prune);
    }

    #[test]
    fn known_artist_fast_path_keeps_exact_pair() {
        let index = sample_index();
        let matcher = MultiIndexMatcher::new(&index, ArtistMappings::default(), MatcherConfig::default());
        let result = matcher.classify_known_artist("joy division", "closer");
        assert_eq!(result.decision, Decision::Keep);
    }

    #[test]
    fn known_artist_fast_path_prunes_unmatched_title() {
        let index = sample_index();
        let matcher = MultiIndexMatcher::new(&index, ArtistMappings::default(), MatcherConfig::default());
        let result = matcher.classify_known_artist("joy division", "an entirely different record");
        assert_eq!(result.decision, Decision::Prune);
    }
}
