//! Request, candidate, match, and report types for the search core.
//!
//! Every response shape is an explicit value type with statically known
//! fields: successful reports always carry `success: true`, and rejected
//! or failed requests serialize as an [`ErrorReport`], never as a partial
//! success payload.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SearchError;

// ─── Requests ───────────────────────────────────────────────────────────

/// File-level search: find files whose name or content matches keywords.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSearchRequest {
    /// Whitespace-separated keywords.
    pub keywords: String,
    /// Optional extension allowlist, e.g. `[".md", "txt"]`.
    #[serde(default)]
    pub file_types: Option<Vec<String>>,
    /// Global cap on returned files.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Also look inside file contents, not just names.
    #[serde(default = "default_true")]
    pub search_content: bool,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Content-level search: extract matching passages from selected files.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentSearchRequest {
    /// File-name patterns: case-insensitive substrings, or globs when
    /// a pattern contains `*`.
    pub file_names: Vec<String>,
    /// Whitespace-separated keywords.
    pub keywords: String,
    /// Context lines returned on each side of a match.
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_max_per_file")]
    pub max_results_per_file: usize,
}

fn default_max_results() -> usize {
    20
}
fn default_true() -> bool {
    true
}
fn default_context_lines() -> usize {
    3
}
fn default_max_per_file() -> usize {
    10
}

// ─── Normalized query ───────────────────────────────────────────────────

/// The validated, normalized form both request shapes reduce to.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub file_patterns: Vec<String>,
    /// Lower-cased extensions with a leading dot, when a filter was given.
    pub file_types: Option<Vec<String>>,
    pub context_lines: usize,
    pub case_sensitive: bool,
    pub per_file_cap: usize,
    /// Only the file-level variant caps the global result list.
    pub global_cap: Option<usize>,
}

impl SearchQuery {
    pub fn for_files(req: &FileSearchRequest) -> Result<Self, SearchError> {
        let keywords = split_keywords(&req.keywords)?;
        Ok(Self {
            keywords,
            // The file-level variant considers every file; keyword/name
            // matching happens per candidate, not in the locator.
            file_patterns: vec!["*".to_string()],
            file_types: req.file_types.as_deref().map(normalize_types),
            context_lines: 0,
            case_sensitive: req.case_sensitive,
            per_file_cap: 10,
            global_cap: Some(req.max_results),
        })
    }

    pub fn for_content(req: &ContentSearchRequest) -> Result<Self, SearchError> {
        let keywords = split_keywords(&req.keywords)?;
        let file_patterns: Vec<String> = req
            .file_names
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if file_patterns.is_empty() {
            return Err(SearchError::EmptyFilePatterns);
        }
        Ok(Self {
            keywords,
            file_patterns,
            file_types: None,
            context_lines: req.context_lines,
            case_sensitive: req.case_sensitive,
            per_file_cap: req.max_results_per_file,
            global_cap: None,
        })
    }
}

fn split_keywords(raw: &str) -> Result<Vec<String>, SearchError> {
    let keywords: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
    if keywords.is_empty() {
        return Err(SearchError::EmptyKeywords);
    }
    Ok(keywords)
}

/// Normalize an extension filter: lower-case, leading dot.
fn normalize_types(types: &[String]) -> Vec<String> {
    types
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| {
            if t.starts_with('.') {
                t.to_lowercase()
            } else {
                format!(".{}", t.to_lowercase())
            }
        })
        .collect()
}

// ─── Candidates ─────────────────────────────────────────────────────────

/// A file that passed name/type filtering and is eligible for extraction.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    /// Lower-cased extension with leading dot; empty when the file has none.
    pub extension: String,
}

impl FileCandidate {
    pub fn file_info(&self) -> FileInfo {
        FileInfo {
            name: self.name.clone(),
            path: self.path.display().to_string(),
            size: self.size,
            modified_time: self.modified_time(),
            file_type: self.file_type(),
        }
    }

    pub fn modified_time(&self) -> String {
        match self.modified {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => "unknown".to_string(),
        }
    }

    pub fn file_type(&self) -> String {
        if self.extension.is_empty() {
            "unknown".to_string()
        } else {
            self.extension.clone()
        }
    }
}

/// Derive the candidate extension from a path.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

// ─── Content matches ────────────────────────────────────────────────────

#[derive(Debug, Serialize, Clone)]
pub struct ContextWindow {
    pub before: Vec<String>,
    pub matched_line: String,
    pub after: Vec<String>,
}

/// Relevance components; `score` is the clamped sum (see [`crate::score`]).
#[derive(Debug, Serialize, Clone)]
pub struct Relevance {
    pub score: f64,
    pub position_bonus: f64,
    pub context_bonus: f64,
    pub length_bonus: f64,
    pub density_bonus: f64,
}

/// `whole_word` is a derived label: the matched span equals the keyword
/// (case-folded under a case-insensitive query). Matching itself is
/// always literal substring matching.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    WholeWord,
    Partial,
}

#[derive(Debug, Serialize, Clone)]
pub struct MatchMetadata {
    pub match_type: MatchKind,
    pub occurrences_in_line: usize,
    pub match_start: usize,
    pub match_end: usize,
}

/// One located occurrence of one keyword in one line.
#[derive(Debug, Serialize, Clone)]
pub struct ContentMatch {
    pub keyword: String,
    /// 1-based over the extracted (blank-filtered) line sequence.
    pub line_number: usize,
    pub exact_match: String,
    pub context: ContextWindow,
    pub relevance: Relevance,
    pub metadata: MatchMetadata,
}

// ─── Content-level report ───────────────────────────────────────────────

#[derive(Debug, Serialize, Clone)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub modified_time: String,
    pub file_type: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct FileSummary {
    pub total_matches: usize,
    pub unique_keywords: Vec<String>,
    pub avg_relevance_score: f64,
}

#[derive(Debug, Serialize)]
pub struct FileResult {
    pub file_info: FileInfo,
    pub content_matches: Vec<ContentMatch>,
    pub summary: FileSummary,
}

#[derive(Debug, Serialize)]
pub struct ContentQueryEcho {
    pub keywords: Vec<String>,
    pub file_patterns: Vec<String>,
    pub directory: String,
    pub context_lines: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchStatistics {
    pub total_files_scanned: usize,
    pub files_with_matches: usize,
    pub total_matches_found: usize,
    pub unique_keywords_matched: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ContentSearchReport {
    pub success: bool,
    pub query: ContentQueryEcho,
    pub statistics: SearchStatistics,
    pub results: Vec<FileResult>,
    pub recommendations: Vec<String>,
    pub message: String,
}

// ─── File-level report ──────────────────────────────────────────────────

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileMatchKind {
    Filename,
    Content,
    FilenameAndContent,
}

/// A single hit inside a located file: either in its name or its content.
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileMatch {
    Filename {
        keyword: String,
        matched_text: String,
        position: usize,
    },
    Content {
        keyword: String,
        matched_text: String,
        line_number: usize,
        context: String,
    },
}

#[derive(Debug, Serialize)]
pub struct FileHit {
    pub file_name: String,
    pub file_path: String,
    pub file_size: u64,
    pub file_type: String,
    pub modified_time: String,
    pub match_type: FileMatchKind,
    pub relevance_score: f64,
    pub matches: Vec<FileMatch>,
}

#[derive(Debug, Serialize)]
pub struct FileSearchReport {
    pub success: bool,
    pub query: String,
    pub directory: String,
    pub total_files_scanned: usize,
    pub matching_files: usize,
    pub results: Vec<FileHit>,
    pub message: String,
}

// ─── Failure payload ────────────────────────────────────────────────────

/// The one shape every rejected or failed request serializes to.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl From<&SearchError> for ErrorReport {
    fn from(err: &SearchError) -> Self {
        Self {
            success: false,
            error: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl ErrorReport {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: code.into(),
            message: message.into(),
        }
    }
}
