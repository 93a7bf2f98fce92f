// SPDX-License-Identifier: AGPL-3.0-or-later

//! Read-only reporting: classification summaries and cache-size estimates.
//! Observability, not a pipeline step — carried as ambient tooling the same
//! way structured logging is.

use catcache_core::classifier::ClassificationReport;
use catcache_repo::prune::TableSize;

/// Formats a byte count the way `verify_cache.py`'s `format_bytes` does:
/// binary units, two decimal places, capped at TiB.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Renders a [`ClassificationReport`] and a set of [`TableSize`]s as a
/// human-readable summary, matching `verify_cache.py`'s `print_report`.
#[must_use]
pub fn format_report(report: &ClassificationReport, table_sizes: &[TableSize]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total releases classified: {}\n", report.total_releases));
    out.push_str(&format!("  keep:   {}\n", report.keep_ids.len()));
    out.push_str(&format!("  prune:  {}\n", report.prune_ids.len()));
    out.push_str(&format!("  review: {}\n", report.review_ids.len()));

    if !table_sizes.is_empty() {
        out.push_str("\nTable sizes:\n");
        let total_bytes: u64 = table_sizes.iter().map(|t| t.size_bytes).sum();
        for size in table_sizes {
            out.push_str(&format!("  {:<24} {:>10} rows, {}\n", size.table, size.row_count, format_bytes(size.size_bytes)));
        }
        out.push_str(&format!("  {:<24} {}\n", "total", format_bytes(total_bytes)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::format_bytes;

    #[test]
    fn formats_whole_bytes_without_decimals() {
        assert_eq!(format_bytes(512), "512 B");
    }

    #[test]
    fn formats_mebibytes_with_two_decimals() {
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MiB");
    }
}
