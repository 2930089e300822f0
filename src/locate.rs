//! Candidate file discovery.
//!
//! Walks the knowledge root depth-first and keeps the files whose name
//! matches at least one pattern and whose extension passes the optional
//! allowlist. Hidden entries (dot-prefixed) are pruned, unreadable
//! directories are skipped with a warning, and sibling traversal always
//! continues. Sibling order is whatever the OS hands back; ranking
//! downstream provides the deterministic order.

use chrono::{DateTime, Local};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::error::{SearchError, SkipReason};
use crate::models::{extension_of, FileCandidate, SearchQuery};

/// Compiled file-name patterns: `*`-patterns become anchored globs,
/// everything else is a case-insensitive substring test.
pub struct FilePatterns {
    literals: Vec<String>,
    globs: Option<GlobSet>,
}

impl FilePatterns {
    pub fn compile(patterns: &[String]) -> Self {
        let mut literals = Vec::new();
        let mut builder = GlobSetBuilder::new();
        let mut glob_count = 0usize;

        for pattern in patterns {
            if pattern.contains('*') {
                match GlobBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(glob) => {
                        builder.add(glob);
                        glob_count += 1;
                    }
                    Err(err) => {
                        // Unparseable glob degrades to a substring pattern.
                        warn!(pattern = %pattern, error = %err, "invalid glob pattern");
                        literals.push(pattern.to_lowercase());
                    }
                }
            } else {
                literals.push(pattern.to_lowercase());
            }
        }

        let globs = if glob_count > 0 {
            match builder.build() {
                Ok(set) => Some(set),
                Err(err) => {
                    warn!(error = %err, "failed to build glob set");
                    None
                }
            }
        } else {
            None
        };

        Self { literals, globs }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let lowered = file_name.to_lowercase();
        if self.literals.iter().any(|lit| lowered.contains(lit)) {
            return true;
        }
        self.globs
            .as_ref()
            .map(|set| set.is_match(file_name))
            .unwrap_or(false)
    }
}

/// What a walk produced.
#[derive(Debug)]
pub struct LocateOutcome {
    pub candidates: Vec<FileCandidate>,
    /// Every non-hidden file the walk visited, before name/type filtering.
    /// The file-level report counts these as scanned.
    pub files_walked: usize,
}

/// Walk `root` and collect candidates for `query`.
///
/// The only fatal condition: `root` missing or not a directory.
pub fn locate(root: &Path, query: &SearchQuery) -> Result<LocateOutcome, SearchError> {
    if !root.exists() {
        return Err(SearchError::DirectoryNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(SearchError::NotADirectory(root.to_path_buf()));
    }

    let patterns = FilePatterns::compile(&query.file_patterns);
    let mut candidates = Vec::new();
    let mut files_walked = 0usize;

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(
                    reason = SkipReason::PermissionDenied.as_str(),
                    error = %err,
                    "skipping unreadable entry"
                );
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        files_walked += 1;

        let name = entry.file_name().to_string_lossy().to_string();
        if !patterns.matches(&name) {
            continue;
        }

        let extension = extension_of(entry.path());
        if let Some(allowed) = &query.file_types {
            if !allowed.iter().any(|a| a == &extension) {
                continue;
            }
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(
                    reason = SkipReason::PermissionDenied.as_str(),
                    path = %entry.path().display(),
                    error = %err,
                    "skipping file without readable metadata"
                );
                continue;
            }
        };

        let modified: Option<DateTime<Local>> = metadata.modified().ok().map(DateTime::from);

        candidates.push(FileCandidate {
            path: entry.path().to_path_buf(),
            name,
            size: metadata.len(),
            modified,
            extension,
        });
    }

    Ok(LocateOutcome {
        candidates,
        files_walked,
    })
}

/// Dot-prefixed entries are invisible to the walk. The root itself is
/// exempt so a hidden working directory can still be searched.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}
