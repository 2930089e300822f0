//! The search core.
//!
//! Both request shapes reduce to the same pipeline: validate and
//! normalize the query, locate candidates, then fan per-file extraction
//! and matching out to a bounded pool of blocking workers while a single
//! collector aggregates the results. Requests are stateless; nothing
//! survives between calls.
//!
//! Failure isolation: one undecodable file or unreadable directory never
//! aborts the batch. The only fatal path is query rejection, which
//! happens before any filesystem work.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::Config;
use crate::context;
use crate::error::SearchError;
use crate::extract::Extractors;
use crate::locate;
use crate::matcher::{self, KeywordMatcher};
use crate::models::{
    ContentMatch, ContentQueryEcho, ContentSearchReport, ContentSearchRequest, FileCandidate,
    FileHit, FileMatch, FileMatchKind, FileResult, FileSearchReport, FileSearchRequest,
    MatchMetadata, SearchQuery, SearchStatistics,
};
use crate::report;
use crate::score::{self, ScoringConfig};

/// Content hits recorded per file by the file-level variant. The
/// file-level response is a locator, not an excerpt reader, so a handful
/// of spans per file is enough to rank and explain the hit.
const FILE_SEARCH_CONTENT_CAP: usize = 10;

/// Bytes of surrounding text kept in file-level content snippets.
const SNIPPET_RADIUS: usize = 20;

/// Everything the core needs, independent of how the process was
/// configured. Binaries build it from [`Config`]; tests build it inline.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub root: PathBuf,
    pub workers: usize,
    pub deadline: Duration,
    pub max_file_bytes: u64,
    pub scoring: ScoringConfig,
}

impl SearchConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            root: cfg.knowledge.root.clone(),
            workers: cfg.scan.workers,
            deadline: Duration::from_secs(cfg.scan.deadline_secs),
            max_file_bytes: cfg.scan.max_file_bytes,
            scoring: cfg.scoring.clone(),
        }
    }
}

// ─── Content-level search ───────────────────────────────────────────────

/// Extract matching passages with context from files selected by name.
pub async fn search_content(
    cfg: &SearchConfig,
    req: &ContentSearchRequest,
) -> Result<ContentSearchReport, SearchError> {
    let query = SearchQuery::for_content(req)?;
    let located = locate::locate(&cfg.root, &query)?;
    let directory = cfg.root.display().to_string();

    if located.candidates.is_empty() {
        return Ok(ContentSearchReport {
            success: true,
            query: echo_query(&query, &directory),
            statistics: SearchStatistics {
                total_files_scanned: 0,
                files_with_matches: 0,
                total_matches_found: 0,
                unique_keywords_matched: Vec::new(),
            },
            results: Vec::new(),
            recommendations: vec![format!(
                "No files matched the requested name patterns: {}",
                query.file_patterns.join(", ")
            )],
            message: "No matching files found".to_string(),
        });
    }

    let files_scanned = located.candidates.len();
    let matchers = Arc::new(matcher::compile_all(&query.keywords, query.case_sensitive));
    let extractors = Arc::new(Extractors::new(cfg.max_file_bytes));
    let scoring = Arc::new(cfg.scoring.clone());
    let context_lines = query.context_lines;

    let outcomes = run_workers(cfg, located.candidates, move |candidate| {
        let matches = scan_candidate_content(
            &extractors,
            &matchers,
            &scoring,
            context_lines,
            &candidate,
        );
        (candidate, matches)
    })
    .await;

    let mut results: Vec<FileResult> = outcomes
        .into_iter()
        .filter(|(_, matches)| !matches.is_empty())
        .map(|(candidate, matches)| {
            report::build_file_result(&candidate, matches, query.per_file_cap)
        })
        .collect();
    // A zero per-file cap empties every match list; such files drop out.
    results.retain(|r| !r.content_matches.is_empty());
    report::rank_file_results(&mut results);

    let statistics = report::content_statistics(files_scanned, &results);
    let recommendations = report::recommendations(&results, &query.keywords);
    let message = report::content_message(
        statistics.total_matches_found,
        statistics.files_with_matches,
    );

    info!(
        files_scanned,
        matches = statistics.total_matches_found,
        "content search complete"
    );

    Ok(ContentSearchReport {
        success: true,
        query: echo_query(&query, &directory),
        statistics,
        results,
        recommendations,
        message,
    })
}

fn echo_query(query: &SearchQuery, directory: &str) -> ContentQueryEcho {
    ContentQueryEcho {
        keywords: query.keywords.clone(),
        file_patterns: query.file_patterns.clone(),
        directory: directory.to_string(),
        context_lines: query.context_lines,
    }
}

/// All matches in one file: every occurrence of every keyword, with
/// context and relevance. Produced in (line, keyword) order so the later
/// stable sort keeps equal scores deterministic.
fn scan_candidate_content(
    extractors: &Extractors,
    matchers: &[KeywordMatcher],
    scoring: &ScoringConfig,
    context_lines: usize,
    candidate: &FileCandidate,
) -> Vec<ContentMatch> {
    let lines = extractors.extract_lines(candidate);
    let mut matches = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_number = idx + 1;
        for keyword_matcher in matchers {
            let spans = keyword_matcher.find_spans(line);
            if spans.is_empty() {
                continue;
            }
            let occurrences = spans.len();
            for span in spans {
                let window = context::window(&lines, line_number, context_lines);
                let relevance = score::score_match(
                    scoring,
                    line,
                    span.start,
                    occurrences,
                    window.before.len(),
                    window.after.len(),
                );
                matches.push(ContentMatch {
                    keyword: keyword_matcher.keyword().to_string(),
                    line_number,
                    exact_match: span.text.clone(),
                    metadata: MatchMetadata {
                        match_type: keyword_matcher.kind_of(&span.text),
                        occurrences_in_line: occurrences,
                        match_start: span.start,
                        match_end: span.end,
                    },
                    context: window,
                    relevance,
                });
            }
        }
    }

    matches
}

// ─── File-level search ──────────────────────────────────────────────────

/// Locate files whose name or content matches the keywords.
pub async fn search_files(
    cfg: &SearchConfig,
    req: &FileSearchRequest,
) -> Result<FileSearchReport, SearchError> {
    let query = SearchQuery::for_files(req)?;
    let located = locate::locate(&cfg.root, &query)?;
    let directory = cfg.root.display().to_string();

    let total_files_scanned = located.files_walked;
    let matchers = Arc::new(matcher::compile_all(&query.keywords, query.case_sensitive));
    let extractors = Arc::new(Extractors::new(cfg.max_file_bytes));
    let scoring = Arc::new(cfg.scoring.clone());
    let search_content = req.search_content;

    let outcomes = run_workers(cfg, located.candidates, move |candidate| {
        scan_candidate_file(&extractors, &matchers, &scoring, search_content, &candidate)
    })
    .await;

    let mut hits: Vec<FileHit> = outcomes.into_iter().flatten().collect();
    report::rank_file_hits(&mut hits);
    if let Some(cap) = query.global_cap {
        hits.truncate(cap);
    }

    let message = report::file_message(hits.len(), total_files_scanned);
    info!(
        total_files_scanned,
        matching = hits.len(),
        "file search complete"
    );

    Ok(FileSearchReport {
        success: true,
        query: req.keywords.clone(),
        directory,
        total_files_scanned,
        matching_files: hits.len(),
        results: hits,
        message,
    })
}

fn scan_candidate_file(
    extractors: &Extractors,
    matchers: &[KeywordMatcher],
    scoring: &ScoringConfig,
    search_content: bool,
    candidate: &FileCandidate,
) -> Option<FileHit> {
    let mut matches: Vec<FileMatch> = Vec::new();

    let mut filename_hits = 0usize;
    for keyword_matcher in matchers {
        for span in keyword_matcher.find_spans(&candidate.name) {
            filename_hits += 1;
            matches.push(FileMatch::Filename {
                keyword: keyword_matcher.keyword().to_string(),
                matched_text: span.text,
                position: span.start,
            });
        }
    }

    let mut content_hits = 0usize;
    if search_content && extractors.supports(&candidate.extension) {
        let lines = extractors.extract_lines(candidate);
        'lines: for (idx, line) in lines.iter().enumerate() {
            for keyword_matcher in matchers {
                for span in keyword_matcher.find_spans(line) {
                    content_hits += 1;
                    matches.push(FileMatch::Content {
                        keyword: keyword_matcher.keyword().to_string(),
                        matched_text: span.text.clone(),
                        line_number: idx + 1,
                        context: snippet(line, span.start, span.end),
                    });
                    if content_hits >= FILE_SEARCH_CONTENT_CAP {
                        break 'lines;
                    }
                }
            }
        }
    }

    if matches.is_empty() {
        return None;
    }

    let match_type = match (filename_hits > 0, content_hits > 0) {
        (true, true) => FileMatchKind::FilenameAndContent,
        (true, false) => FileMatchKind::Filename,
        _ => FileMatchKind::Content,
    };

    Some(FileHit {
        file_name: candidate.name.clone(),
        file_path: candidate.path.display().to_string(),
        file_size: candidate.size,
        file_type: candidate.file_type(),
        modified_time: candidate.modified_time(),
        match_type,
        relevance_score: score::score_file(scoring, filename_hits, content_hits),
        matches,
    })
}

/// A short slice of the line around a span, snapped to char boundaries.
fn snippet(line: &str, start: usize, end: usize) -> String {
    let mut s = start.saturating_sub(SNIPPET_RADIUS);
    let mut e = (end + SNIPPET_RADIUS).min(line.len());
    while s > 0 && !line.is_char_boundary(s) {
        s -= 1;
    }
    while e < line.len() && !line.is_char_boundary(e) {
        e += 1;
    }
    line[s..e].trim().to_string()
}

// ─── Worker pool ────────────────────────────────────────────────────────

/// Run `work` once per candidate on blocking workers, at most
/// `cfg.workers` in flight, and collect the results in one place.
///
/// A deadline bounds the whole fan-out: when it expires, unfinished
/// workers are abandoned and whatever has been collected so far is
/// returned as a degraded-but-valid result.
async fn run_workers<T, F>(cfg: &SearchConfig, candidates: Vec<FileCandidate>, work: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(FileCandidate) -> T + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(cfg.workers.max(1)));
    let work = Arc::new(work);
    let mut tasks: JoinSet<Option<T>> = JoinSet::new();

    for candidate in candidates {
        let semaphore = semaphore.clone();
        let work = work.clone();
        tasks.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return None,
            };
            tokio::task::spawn_blocking(move || (*work)(candidate)).await.ok()
        });
    }

    let deadline = Instant::now() + cfg.deadline;
    let mut results = Vec::new();

    loop {
        match tokio::time::timeout_at(deadline, tasks.join_next()).await {
            Err(_) => {
                warn!(
                    collected = results.len(),
                    "scan deadline exceeded; returning partial results"
                );
                tasks.abort_all();
                break;
            }
            Ok(None) => break,
            Ok(Some(Ok(Some(result)))) => results.push(result),
            Ok(Some(Ok(None))) => {}
            Ok(Some(Err(err))) => {
                if !err.is_cancelled() {
                    warn!(error = %err, "scan worker failed");
                }
            }
        }
    }

    results
}
