//! Context windows around matched lines.

use crate::models::ContextWindow;

/// Slice up to `k` lines strictly before and after the 1-based
/// `line_number`, clamped at the file's edges, never padded and never out
/// of bounds. Returned lines have trailing whitespace stripped.
pub fn window(lines: &[String], line_number: usize, k: usize) -> ContextWindow {
    debug_assert!(line_number >= 1 && line_number <= lines.len());
    let idx = line_number - 1;
    let start = idx.saturating_sub(k);
    let end = (idx + 1 + k).min(lines.len());

    ContextWindow {
        before: lines[start..idx].iter().map(|l| rstrip(l)).collect(),
        matched_line: rstrip(&lines[idx]),
        after: lines[idx + 1..end].iter().map(|l| rstrip(l)).collect(),
    }
}

fn rstrip(line: &str) -> String {
    line.trim_end().to_string()
}
