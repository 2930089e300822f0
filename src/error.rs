//! Error taxonomy for the search core.
//!
//! Only query rejection is fatal. Everything that goes wrong below the
//! query boundary (an unreadable directory, a file with no usable decoder,
//! a corrupt PDF) is recovered where it happens: the entry is skipped with
//! a logged warning and the scan continues with its siblings.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal request errors, raised before any filesystem work starts.
///
/// Surfaced to callers as a `success: false` payload with the machine
/// code from [`SearchError::code`] and the display message.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request contained no usable keyword after trimming.
    #[error("search keywords must not be empty")]
    EmptyKeywords,

    /// The request contained no usable file-name pattern after trimming.
    #[error("file name patterns must not be empty")]
    EmptyFilePatterns,

    /// The configured knowledge root does not exist.
    #[error("knowledge directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    /// The configured knowledge root exists but is not a directory.
    #[error("knowledge path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl SearchError {
    /// Machine-readable error code used in `success: false` payloads.
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::EmptyKeywords => "empty_keywords",
            SearchError::EmptyFilePatterns => "empty_file_patterns",
            SearchError::DirectoryNotFound(_) => "directory_not_found",
            SearchError::NotADirectory(_) => "not_a_directory",
        }
    }
}

/// Why a directory entry or file was skipped during a scan.
///
/// Skips are logged and the entry contributes nothing to the report;
/// they never abort the surrounding scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry could not be opened or listed.
    PermissionDenied,
    /// No extractor is registered for the file's extension.
    UnsupportedFormat,
    /// Every applicable decoding backend failed.
    DecodeFailed,
    /// The file exceeds the configured extraction byte ceiling.
    TooLarge,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::PermissionDenied => "permission_denied",
            SkipReason::UnsupportedFormat => "unsupported_format",
            SkipReason::DecodeFailed => "decode_failed",
            SkipReason::TooLarge => "too_large",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(SearchError::EmptyKeywords.code(), "empty_keywords");
        assert_eq!(
            SearchError::DirectoryNotFound(PathBuf::from("/missing")).code(),
            "directory_not_found"
        );
    }
}
