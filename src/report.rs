//! Ranking, statistics, and advisory recommendations.
//!
//! Ordering here is what makes reports reproducible: walk order is
//! unspecified, so every list a caller sees is sorted with an explicit
//! tie-break before any truncation, and statistics are computed over the
//! pre-truncation set.

use std::collections::BTreeSet;

use crate::models::{
    ContentMatch, FileCandidate, FileHit, FileResult, FileSummary, SearchStatistics,
};
use crate::score;

/// Average-relevance threshold above which a file is called out first.
const HIGH_RELEVANCE: f64 = 0.8;

/// Sort a file's matches by score descending and truncate to the cap.
///
/// The sort is stable and matches are produced in (line, keyword) order,
/// so equal scores keep a deterministic order.
pub fn build_file_result(
    candidate: &FileCandidate,
    mut matches: Vec<ContentMatch>,
    per_file_cap: usize,
) -> FileResult {
    matches.sort_by(|a, b| {
        b.relevance
            .score
            .partial_cmp(&a.relevance.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(per_file_cap);

    let unique_keywords: Vec<String> = matches
        .iter()
        .map(|m| m.keyword.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    FileResult {
        file_info: candidate.file_info(),
        summary: FileSummary {
            total_matches: matches.len(),
            unique_keywords,
            avg_relevance_score: score::average_score(&matches),
        },
        content_matches: matches,
    }
}

/// Order files by average relevance descending, path ascending on ties.
pub fn rank_file_results(results: &mut [FileResult]) {
    results.sort_by(|a, b| {
        b.summary
            .avg_relevance_score
            .partial_cmp(&a.summary.avg_relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.file_info.path.cmp(&b.file_info.path))
    });
}

/// Order located files by relevance descending, path ascending on ties.
pub fn rank_file_hits(hits: &mut [FileHit]) {
    hits.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.file_path.cmp(&b.file_path))
    });
}

/// Statistics over the full (pre-truncation) result set.
pub fn content_statistics(files_scanned: usize, results: &[FileResult]) -> SearchStatistics {
    let matched: BTreeSet<String> = results
        .iter()
        .flat_map(|r| r.content_matches.iter().map(|m| m.keyword.clone()))
        .collect();

    SearchStatistics {
        total_files_scanned: files_scanned,
        files_with_matches: results.len(),
        total_matches_found: results.iter().map(|r| r.summary.total_matches).sum(),
        unique_keywords_matched: matched.into_iter().collect(),
    }
}

/// Advisory strings derived from the result set. Never fails; an empty
/// result set yields a single no-matches advisory.
pub fn recommendations(results: &[FileResult], requested_keywords: &[String]) -> Vec<String> {
    if results.is_empty() {
        return vec![
            "No matching content found. Try different keywords or file name patterns.".to_string(),
        ];
    }

    let mut recs = Vec::new();

    let best = results
        .iter()
        .filter(|r| r.summary.avg_relevance_score > HIGH_RELEVANCE)
        .max_by(|a, b| {
            a.summary
                .avg_relevance_score
                .partial_cmp(&b.summary.avg_relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if let Some(best) = best {
        recs.push(format!(
            "Start with '{}', it has the highest average relevance.",
            best.file_info.name
        ));
    }

    let matched: BTreeSet<&str> = results
        .iter()
        .flat_map(|r| r.content_matches.iter().map(|m| m.keyword.as_str()))
        .collect();
    let missing: Vec<&str> = requested_keywords
        .iter()
        .map(String::as_str)
        .filter(|kw| !matched.contains(kw))
        .collect();
    if !missing.is_empty() {
        recs.push(format!(
            "No matches found for keywords: {}",
            missing.join(", ")
        ));
    }

    if results.len() > 1 {
        recs.push(format!(
            "Matching content spans {} files; consider reviewing them together.",
            results.len()
        ));
    }

    recs
}

pub fn content_message(total_matches: usize, files_with_matches: usize) -> String {
    format!(
        "Extracted {} content matches from {} files",
        total_matches, files_with_matches
    )
}

pub fn file_message(matching: usize, scanned: usize) -> String {
    format!("Found {} matching files out of {} scanned", matching, scanned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContextWindow, MatchKind, MatchMetadata, Relevance};
    use std::path::PathBuf;

    fn candidate(name: &str) -> FileCandidate {
        FileCandidate {
            path: PathBuf::from(format!("/kb/{}", name)),
            name: name.to_string(),
            size: 10,
            modified: None,
            extension: ".md".to_string(),
        }
    }

    fn content_match(keyword: &str, line: usize, score: f64) -> ContentMatch {
        ContentMatch {
            keyword: keyword.to_string(),
            line_number: line,
            exact_match: keyword.to_string(),
            context: ContextWindow {
                before: vec![],
                matched_line: keyword.to_string(),
                after: vec![],
            },
            relevance: Relevance {
                score,
                position_bonus: 0.0,
                context_bonus: 0.0,
                length_bonus: 0.0,
                density_bonus: 0.0,
            },
            metadata: MatchMetadata {
                match_type: MatchKind::WholeWord,
                occurrences_in_line: 1,
                match_start: 0,
                match_end: keyword.len(),
            },
        }
    }

    fn file_result(name: &str, scores: &[f64]) -> FileResult {
        let matches = scores
            .iter()
            .enumerate()
            .map(|(i, s)| content_match("kw", i + 1, *s))
            .collect();
        build_file_result(&candidate(name), matches, 10)
    }

    #[test]
    fn matches_sort_by_score_and_cap() {
        let matches = vec![
            content_match("a", 1, 0.5),
            content_match("b", 2, 0.9),
            content_match("c", 3, 0.7),
        ];
        let result = build_file_result(&candidate("x.md"), matches, 2);
        assert_eq!(result.content_matches.len(), 2);
        assert_eq!(result.content_matches[0].keyword, "b");
        assert_eq!(result.content_matches[1].keyword, "c");
        // Summary reflects the capped set.
        assert_eq!(result.summary.total_matches, 2);
    }

    #[test]
    fn equal_scores_keep_insertion_order() {
        let matches = vec![content_match("a", 1, 0.5), content_match("b", 2, 0.5)];
        let result = build_file_result(&candidate("x.md"), matches, 10);
        assert_eq!(result.content_matches[0].keyword, "a");
    }

    #[test]
    fn files_rank_by_average_then_path() {
        let mut results = vec![
            file_result("b.md", &[0.5]),
            file_result("a.md", &[0.5]),
            file_result("c.md", &[0.9]),
        ];
        rank_file_results(&mut results);
        assert_eq!(results[0].file_info.name, "c.md");
        assert_eq!(results[1].file_info.name, "a.md");
        assert_eq!(results[2].file_info.name, "b.md");
    }

    #[test]
    fn statistics_aggregate_across_files() {
        let results = vec![file_result("a.md", &[0.5, 0.6]), file_result("b.md", &[0.7])];
        let stats = content_statistics(5, &results);
        assert_eq!(stats.total_files_scanned, 5);
        assert_eq!(stats.files_with_matches, 2);
        assert_eq!(stats.total_matches_found, 3);
        assert_eq!(stats.unique_keywords_matched, vec!["kw"]);
    }

    #[test]
    fn empty_results_yield_single_advisory() {
        let recs = recommendations(&[], &["deploy".to_string()]);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("No matching content"));
    }

    #[test]
    fn high_relevance_file_is_called_out() {
        let results = vec![file_result("hot.md", &[0.95, 0.9]), file_result("cool.md", &[0.4])];
        let recs = recommendations(&results, &["kw".to_string()]);
        assert!(recs.iter().any(|r| r.contains("hot.md")));
        assert!(recs.iter().any(|r| r.contains("2 files")));
    }

    #[test]
    fn unmatched_keywords_are_listed() {
        let results = vec![file_result("a.md", &[0.5])];
        let recs = recommendations(&results, &["kw".to_string(), "missing".to_string()]);
        assert!(recs.iter().any(|r| r.contains("missing")));
        assert!(!recs.iter().any(|r| r.contains("kw,")));
    }
}
