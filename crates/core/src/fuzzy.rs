// SPDX-License-Identifier: AGPL-3.0-or-later

//! String-similarity ratios, implemented from scratch using the
//! Ratcliff/Obershelp "gestalt pattern matching" algorithm (the same
//! algorithm behind Python's `difflib.SequenceMatcher`, which `rapidfuzz`'s
//! `ratio`/`token_sort_ratio`/`token_set_ratio` build on).
//!
//! Edit-distance-based measures (Levenshtein, Jaro-Winkler) have no
//! token-aware ratios, so those are implemented here directly on top of the
//! matching-blocks primitive instead of pulling in a crate just for that.

use std::collections::HashMap;

/// Returns the total number of matched characters between `a` and `b`,
/// found by recursively locating the longest common (contiguous) run and
/// then recursing on the unmatched prefix/suffix either side of it.
fn matching_block_length(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, &c) in b.iter().enumerate() {
        b2j.entry(c).or_default().push(j);
    }

    let mut total = 0usize;
    let mut stack = vec![(0usize, a.len(), 0usize, b.len())];

    while let Some((alo, ahi, blo, bhi)) = stack.pop() {
        if alo >= ahi || blo >= bhi {
            continue;
        }

        let (besti, bestj, bestsize) = find_longest_match(a, alo, ahi, b, blo, bhi, &b2j);
        if bestsize == 0 {
            continue;
        }
        total += bestsize;

        if alo < besti && blo < bestj {
            stack.push((alo, besti, blo, bestj));
        }
        if besti + bestsize < ahi && bestj + bestsize < bhi {
            stack.push((besti + bestsize, ahi, bestj + bestsize, bhi));
        }
    }

    total
}

#[allow(clippy::too_many_arguments)]
fn find_longest_match(
    a: &[char],
    alo: usize,
    ahi: usize,
    b: &[char],
    blo: usize,
    bhi: usize,
    b2j: &HashMap<char, Vec<usize>>,
) -> (usize, usize, usize) {
    let mut besti = alo;
    let mut bestj = blo;
    let mut bestsize = 0usize;
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for i in alo..ahi {
        let mut newj2len: HashMap<usize, usize> = HashMap::new();
        if let Some(indices) = b2j.get(&a[i]) {
            for &j in indices {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j2len.get(&j.wrapping_sub(1)).copied().unwrap_or(0) + 1;
                newj2len.insert(j, k);
                if k > bestsize {
                    besti = i + 1 - k;
                    bestj = j + 1 - k;
                    bestsize = k;
                }
            }
        }
        j2len = newj2len;
    }

    (besti, bestj, bestsize)
}

/// Ratcliff/Obershelp similarity ratio of two strings, in `[0.0, 1.0]`.
/// Equivalent to `difflib.SequenceMatcher(None, a, b).ratio()`.
#[must_use]
pub fn ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let total_len = a_chars.len() + b_chars.len();
    if total_len == 0 {
        return 1.0;
    }
    let matched = matching_block_length(&a_chars, &b_chars);
    2.0 * matched as f64 / total_len as f64
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

/// Ratio of the two strings after sorting each string's whitespace-separated
/// tokens alphabetically, making the comparison insensitive to word order.
#[must_use]
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    let a_sorted = sorted_tokens(a).join(" ");
    let b_sorted = sorted_tokens(b).join(" ");
    ratio(&a_sorted, &b_sorted)
}

/// Token-set ratio: splits both strings into token sets, compares the shared
/// tokens against each string's leftover tokens, and returns the best of the
/// three resulting ratios. Robust to one string being a subset of the other
/// (e.g. a short alias containing only some of a full artist name's words).
#[must_use]
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    use std::collections::BTreeSet;

    let a_tokens: BTreeSet<&str> = a.split_whitespace().collect();
    let b_tokens: BTreeSet<&str> = b.split_whitespace().collect();

    let intersection: Vec<&str> = a_tokens.intersection(&b_tokens).copied().collect();
    let a_diff: Vec<&str> = a_tokens.difference(&b_tokens).copied().collect();
    let b_diff: Vec<&str> = b_tokens.difference(&a_tokens).copied().collect();

    let t0 = intersection.join(" ");
    let combined1 = if t0.is_empty() {
        a_diff.join(" ")
    } else if a_diff.is_empty() {
        t0.clone()
    } else {
        format!("{t0} {}", a_diff.join(" "))
    };
    let combined2 = if t0.is_empty() {
        b_diff.join(" ")
    } else if b_diff.is_empty() {
        t0.clone()
    } else {
        format!("{t0} {}", b_diff.join(" "))
    };

    let r1 = ratio(&t0, &combined1);
    let r2 = ratio(&t0, &combined2);
    let r3 = ratio(&combined1, &combined2);

    r1.max(r2).max(r3)
}

/// Scores `query` against every candidate with `scorer`, returning the index
/// and score of the best match. Mirrors `rapidfuzz.process.extractOne`.
/// `score_cutoff` (in `[0.0, 1.0]`), if given, discards matches below it.
pub fn best_match<'c, S, F>(
    query: &str,
    candidates: &'c [S],
    scorer: F,
    score_cutoff: Option<f64>,
) -> Option<(usize, &'c S, f64)>
where
    S: AsRef<str>,
    F: Fn(&str, &str) -> f64,
{
    let cutoff = score_cutoff.unwrap_or(0.0);
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| (i, candidate, scorer(query, candidate.as_ref())))
        .filter(|(_, _, score)| *score >= cutoff)
        .max_by(|(_, _, a), (_, _, b)| a.total_cmp(b))
}

#[cfg(test)]
mod tests {
    use super::{best_match, ratio, token_set_ratio, token_sort_ratio};

    #[test]
    fn ratio_identical_strings_is_one() {
        assert!((ratio("abbey road", "abbey road") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ratio_disjoint_strings_is_zero() {
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        let r = token_sort_ratio("the beatles abbey road", "abbey road the beatles");
        assert!((r - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn token_set_handles_subset_strings() {
        // "joy division" is a subset of "joy division unknown pleasures"
        let r = token_set_ratio("joy division", "joy division unknown pleasures");
        assert!(r > 0.8, "expected high score, got {r}");
    }

    #[test]
    fn token_set_partial_overlap_scores_lower_than_exact() {
        let exact = token_set_ratio("joy division", "joy division");
        let partial = token_set_ratio("joy", "joy division");
        assert!(partial < exact);
    }

    #[test]
    fn best_match_finds_highest_scoring_candidate() {
        let candidates = vec!["closer", "unknown pleasures", "substance"];
        let result = best_match("unknown pleasure", &candidates, token_set_ratio, None);
        let (idx, candidate, score) = result.expect("a match");
        assert_eq!(idx, 1);
        assert_eq!(*candidate, "unknown pleasures");
        assert!(score > 0.9);
    }

    #[test]
    fn best_match_respects_score_cutoff() {
        let candidates = vec!["totally unrelated"];
        let result = best_match("abbey road", &candidates, token_set_ratio, Some(0.5));
        assert!(result.is_none());
    }
}
