// SPDX-License-Identifier: AGPL-3.0-or-later

//! Bulk classification of every release in the catalog against the library
//! index, in four phases of increasing cost:
//!
//! 1. Exact artist match (O(1) per artist).
//! 2. Classify exact-match artists via the fast known-artist path.
//! 3. Token-overlap pre-screen, pruning artists with no plausible library
//!    match without running a single fuzzy scorer.
//! 4. Artist-level fuzzy matching for what remains, matching each artist
//!    once rather than once per release.

use std::collections::HashMap;

use crate::fuzzy::{best_match, token_set_ratio};
use crate::index::LibraryIndex;
use crate::matcher::{classify_compilation, ArtistMappings, Decision, MatchResult, MatcherConfig, MultiIndexMatcher};
use crate::matching::is_compilation_artist;
use crate::model::ReleaseId;
use crate::normalize::{normalize_artist, normalize_title};

/// Minimum token length considered during the phase-3 pre-screen; shorter
/// tokens ("dj", "mc", "j") cause false-positive overlaps.
const MIN_TOKEN_LEN: usize = 3;
/// Minimum artist similarity to consider a fuzzy artist-level match in phase 4.
const ARTIST_MATCH_THRESHOLD: f64 = 0.60;
/// Minimum title similarity to keep a compilation release.
const COMPILATION_THRESHOLD: f64 = 0.80;

/// One row of input to the classifier: a release's id, raw (un-normalized)
/// primary artist credit and title.
#[derive(Debug, Clone)]
pub struct ClassifierInput {
    pub release_id: ReleaseId,
    pub raw_artist: String,
    pub raw_title: String,
}

/// Aggregated results from classifying every release in the catalog.
#[derive(Debug, Clone, Default)]
pub struct ClassificationReport {
    pub keep_ids: Vec<ReleaseId>,
    pub prune_ids: Vec<ReleaseId>,
    pub review_ids: Vec<ReleaseId>,
    /// REVIEW releases grouped by normalized artist, for artist-level triage.
    pub review_by_artist: HashMap<String, Vec<(ReleaseId, String, MatchResult)>>,
    /// One original (un-normalized) artist spelling per normalized artist.
    pub artist_originals: HashMap<String, String>,
    pub total_releases: usize,
}

/// Runs the four-phase classification algorithm over a batch of releases.
#[derive(Debug)]
pub struct ClassifierPipeline<'idx> {
    index: &'idx LibraryIndex,
    matcher: MultiIndexMatcher<'idx>,
    config: MatcherConfig,
}

impl<'idx> ClassifierPipeline<'idx> {
    #[must_use]
    pub fn new(index: &'idx LibraryIndex, artist_mappings: ArtistMappings, config: MatcherConfig) -> Self {
        let matcher = MultiIndexMatcher::new(index, artist_mappings, config);
        Self { index, matcher, config }
    }

    #[must_use]
    pub fn classify_all(&self, releases: &[ClassifierInput]) -> ClassificationReport {
        let mut keep_ids = Vec::new();
        let mut prune_ids = Vec::new();
        let mut review_ids = Vec::new();
        let mut review_by_artist: HashMap<String, Vec<(ReleaseId, String, MatchResult)>> = HashMap::new();
        let mut artist_originals: HashMap<String, String> = HashMap::new();

        // Group by normalized artist for efficient batch processing.
        let mut by_artist: HashMap<String, Vec<&ClassifierInput>> = HashMap::new();
        for release in releases {
            let norm_artist = normalize_artist(&release.raw_artist);
            artist_originals.entry(norm_artist.clone()).or_insert_with(|| release.raw_artist.clone());
            by_artist.entry(norm_artist).or_default().push(release);
        }

        // Phase 1: exact artist match.
        let mut exact_artist_match = Vec::new();
        let mut no_artist_match = Vec::new();
        let mut fuzzy_needed = Vec::new();

        for norm_artist in by_artist.keys() {
            if self.index.contains_artist(norm_artist) {
                exact_artist_match.push(norm_artist.clone());
            } else if self.matcher.artist_mappings().keep.contains_key(norm_artist) {
                exact_artist_match.push(norm_artist.clone());
            } else if self.matcher.artist_mappings().prune.contains_key(norm_artist) {
                no_artist_match.push(norm_artist.clone());
            } else {
                fuzzy_needed.push(norm_artist.clone());
            }
        }

        // Phase 2: classify exact-match artists via the fast path.
        for norm_artist in &exact_artist_match {
            for release in &by_artist[norm_artist] {
                let norm_title = normalize_title(&release.raw_title);
                let result = self.matcher.classify_known_artist(norm_artist, &norm_title);
                match result.decision {
                    Decision::Keep => keep_ids.push(release.release_id),
                    Decision::Prune => prune_ids.push(release.release_id),
                    Decision::Review => {
                        review_ids.push(release.release_id);
                        review_by_artist.entry(norm_artist.clone()).or_default().push((
                            release.release_id,
                            release.raw_title.clone(),
                            result,
                        ));
                    }
                }
            }
        }
        for norm_artist in &no_artist_match {
            for release in &by_artist[norm_artist] {
                prune_ids.push(release.release_id);
            }
        }

        // Phase 3: token-overlap pre-screen.
        let mut library_tokens: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for artist in self.index.all_artists() {
            library_tokens.extend(artist.split_whitespace().filter(|t| t.len() >= MIN_TOKEN_LEN));
        }

        let mut truly_fuzzy = Vec::new();
        for norm_artist in &fuzzy_needed {
            let has_overlap = norm_artist
                .split_whitespace()
                .filter(|t| t.len() >= MIN_TOKEN_LEN)
                .any(|t| library_tokens.contains(t));
            if has_overlap {
                truly_fuzzy.push(norm_artist.clone());
            } else {
                for release in &by_artist[norm_artist] {
                    prune_ids.push(release.release_id);
                }
            }
        }

        // Phase 4: artist-level fuzzy matching for what remains.
        for norm_artist in &truly_fuzzy {
            let artist_releases = &by_artist[norm_artist];
            let raw_artist = &artist_releases[0].raw_artist;

            if is_compilation_artist(raw_artist) {
                for release in artist_releases {
                    let norm_title = normalize_title(&release.raw_title);
                    match classify_compilation(&norm_title, self.index, COMPILATION_THRESHOLD) {
                        Decision::Keep => keep_ids.push(release.release_id),
                        _ => prune_ids.push(release.release_id),
                    }
                }
                continue;
            }

            let artist_match = best_match(
                norm_artist,
                self.index.all_artists(),
                token_set_ratio,
                Some(ARTIST_MATCH_THRESHOLD),
            );

            let Some((_, matched_artist, artist_score)) = artist_match else {
                for release in artist_releases {
                    prune_ids.push(release.release_id);
                }
                continue;
            };

            let matched_titles = self.index.titles_for_artist(matched_artist);

            for release in artist_releases {
                let norm_title = normalize_title(&release.raw_title);

                if self.index.contains_pair(matched_artist, &norm_title) {
                    keep_ids.push(release.release_id);
                    continue;
                }

                let Some(titles) = matched_titles else {
                    prune_ids.push(release.release_id);
                    continue;
                };

                let Some((_, _, title_score)) = best_match(&norm_title, titles, token_set_ratio, None) else {
                    prune_ids.push(release.release_id);
                    continue;
                };

                let combined = (artist_score * title_score).sqrt();

                if combined >= self.config.keep_threshold {
                    keep_ids.push(release.release_id);
                } else if combined >= self.config.review_threshold {
                    review_ids.push(release.release_id);
                    let result = MatchResult {
                        decision: Decision::Review,
                        exact_score: 0.0,
                        token_set_score: 0.0,
                        token_sort_score: 0.0,
                        two_stage_score: combined,
                    };
                    review_by_artist.entry(norm_artist.clone()).or_default().push((
                        release.release_id,
                        release.raw_title.clone(),
                        result,
                    ));
                } else {
                    prune_ids.push(release.release_id);
                }
            }
        }

        ClassificationReport {
            keep_ids,
            prune_ids,
            review_ids,
            review_by_artist,
            artist_originals,
            total_releases: releases.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassifierInput, ClassifierPipeline};
    use crate::index::LibraryIndex;
    use crate::matcher::{ArtistMappings, MatcherConfig};

    fn sample_index() -> LibraryIndex {
        LibraryIndex::from_rows([
            ("Joy Division", "Unknown Pleasures"),
            ("Joy Division", "Closer"),
            ("Various Artists", "Now That's What I Call Music"),
        ])
    }

    #[test]
    fn exact_match_is_kept_fuzzy_is_pruned() {
        let index = sample_index();
        let pipeline = ClassifierPipeline::new(&index, ArtistMappings::default(), MatcherConfig::default());
        let releases = vec![
            ClassifierInput { release_id: 1, raw_artist: "Joy Division".into(), raw_title: "Closer".into() },
            ClassifierInput {
                release_id: 2,
                raw_artist: "Some Totally Unrelated Band".into(),
                raw_title: "Some Totally Unrelated Album".into(),
            },
        ];
        let report = pipeline.classify_all(&releases);
        assert_eq!(report.keep_ids, vec![1]);
        assert_eq!(report.prune_ids, vec![2]);
        assert_eq!(report.total_releases, 2);
    }

    #[test]
    fn compilation_routes_through_title_only_matching() {
        let index = sample_index();
        let pipeline = ClassifierPipeline::new(&index, ArtistMappings::default(), MatcherConfig::default());
        let releases = vec![ClassifierInput {
            release_id: 10,
            raw_artist: "Various".into(),
            raw_title: "Now That's What I Call Music".into(),
        }];
        let report = pipeline.classify_all(&releases);
        assert_eq!(report.keep_ids, vec![10]);
    }
}
