// SPDX-License-Identifier: AGPL-3.0-or-later

//! Normalization rules shared by the [`crate::index`] and [`crate::scoring`] modules.
//!
//! Normalization trades away information the catalog and the library disagree
//! about (accents, disambiguation annotations, format suffixes) so that
//! fuzzy comparison operates on the part of a name both sides agree on.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Definite articles used in the upstream catalog's comma convention across
/// languages: `"Beatles, The"` -> `"The Beatles"`.
const COMMA_ARTICLES: &[&str] = &["the", "los", "las", "les", "la", "le", "el", "die", "der", "das"];

static DISCOGS_DISAMBIGUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+\)\s*$").expect("valid regex"));

static LIBRARY_DISAMBIGUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[.*?\]\s*$").expect("valid regex"));

static AMPERSAND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*&\s*").expect("valid regex"));

static TITLE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?ix)
        \s*(?:
            \d*"                                   # 12", 7" (vinyl inch marks)
            |\(\d+\)                                # (3) Discogs disambiguation
            |\(\d+\s*(?:cd|lp)\s*set\)               # (2 cd set), (3 lp set)
            |\((?:reissue|deluxe\s+edition|expanded\s+edition
                 |anniversary\s+edition|special\s+edition
                 |limited\s+edition|bonus\s+tracks
                 |ep|lp)\)
            |\(\d+lp\)                               # (2lp)
        )\s*$
        "#,
    )
    .expect("valid regex")
});

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4}").expect("valid regex"));

/// Strips combining accent marks, e.g. turns `"Björk"` into `"Bjork"`.
#[must_use]
pub fn strip_accents(s: &str) -> String {
    s.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Aggressively normalizes an artist name for fuzzy comparison: case folding,
/// accent stripping, disambiguation suffix removal and comma-convention flip.
///
/// This is the shared first stage used by both [`normalize_artist`] and the
/// library indexer; it deliberately stops short of ampersand/apostrophe
/// handling so that callers needing only disambiguation-stripping (e.g. when
/// resolving a matched library artist back to a display form) can reuse it.
#[must_use]
pub fn normalize_for_comparison(name: &str) -> String {
    let name = strip_accents(name.trim()).to_lowercase();
    let name = DISCOGS_DISAMBIGUATION_RE.replace(&name, "");
    let name = LIBRARY_DISAMBIGUATION_RE.replace(&name, "");

    for article in COMMA_ARTICLES {
        let suffix = format!(", {article}");
        if let Some(stripped) = name.strip_suffix(suffix.as_str()) {
            return format!("{article} {stripped}").trim().to_string();
        }
    }

    name.trim().to_string()
}

/// Normalizes an artist name for comparison: [`normalize_for_comparison`] plus
/// ampersand normalization, apostrophe removal and whitespace collapsing.
#[must_use]
pub fn normalize_artist(name: &str) -> String {
    let name = normalize_for_comparison(name);
    let name = AMPERSAND_RE.replace_all(&name, " and ");
    let name = name.replace('\'', "");
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes an album/title for comparison: case folding, accent stripping,
/// and repeated stripping of trailing format/edition suffixes
/// (e.g. `"Album 12\" (reissue)"` -> `"album"`).
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let mut title = strip_accents(title.trim()).to_lowercase();
    loop {
        let stripped = TITLE_SUFFIX_RE.replace(&title, "").trim().to_string();
        if stripped == title {
            return title;
        }
        title = stripped;
    }
}

/// Extracts a four-digit year from the start of a catalog `released` field,
/// e.g. `"1987-03-02"` -> `Some(1987)`. Returns `None` if the field does not
/// begin with a four-digit year (including `None`/empty input).
#[must_use]
pub fn extract_year(released: Option<&str>) -> Option<i32> {
    let released = released?;
    if YEAR_RE.is_match(released) {
        released[..4].parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_year, normalize_artist, normalize_title, strip_accents};

    #[test]
    fn strips_accents() {
        assert_eq!(strip_accents("Björk"), "Bjork");
    }

    #[test]
    fn flips_comma_convention() {
        assert_eq!(normalize_artist("Beatles, The"), "the beatles");
    }

    #[test]
    fn strips_discogs_disambiguation() {
        assert_eq!(normalize_artist("Charlie Parker (2)"), "charlie parker");
    }

    #[test]
    fn strips_library_disambiguation_brackets() {
        assert_eq!(normalize_artist("Bastard [Scotland]"), "bastard");
    }

    #[test]
    fn normalizes_ampersand_and_apostrophe() {
        assert_eq!(normalize_artist("Earth, Wind & Fire"), "earth wind and fire");
        assert_eq!(normalize_artist("Guns N' Roses"), "guns n roses");
    }

    #[test]
    fn strips_title_suffixes_repeatedly() {
        assert_eq!(normalize_title(r#"Abbey Road 12" (Reissue)"#), "abbey road");
    }

    #[test]
    fn strips_multi_disc_suffix() {
        assert_eq!(normalize_title("Greatest Hits (2 CD Set)"), "greatest hits");
    }

    #[test]
    fn extracts_year_from_release_date() {
        assert_eq!(extract_year(Some("1987-03-02")), Some(1987));
        assert_eq!(extract_year(Some("1987")), Some(1987));
    }

    #[test]
    fn rejects_non_year_prefixed_release_dates() {
        assert_eq!(extract_year(Some("unknown")), None);
        assert_eq!(extract_year(None), None);
    }
}
