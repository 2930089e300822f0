//! Relevance scoring.
//!
//! Two scoring variants share this module. Content matches are scored
//! per occurrence from where the keyword sits in the line, how much
//! context surrounds it, how substantial the line is, and how often the
//! keyword repeats. Files located by the file-level search are scored
//! from their filename and content hit counts, with filename hits
//! weighted more heavily, since a filename hit is a stronger signal that the
//! whole file is relevant than any single line.
//!
//! The constants are empirical tuning values inherited from the service
//! this replaces. They are kept as named fields with defaults so a
//! `[scoring]` config table can override them without a rebuild.

use serde::Deserialize;

use crate::models::Relevance;

/// Scoring constants. Every field defaults; override any subset in `[scoring]`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score every content match starts from.
    pub base: f64,
    /// Bonus when the match starts at column zero.
    pub line_start_bonus: f64,
    /// Bonus when the match starts within the first 30% of the line.
    pub early_position_bonus: f64,
    /// Bonus when the match starts within the last 30% of the line.
    pub late_position_bonus: f64,
    /// Bonus per context line actually returned around the match.
    pub context_line_bonus: f64,
    pub context_bonus_cap: f64,
    /// Bonus per character of the matched line.
    pub length_bonus_per_char: f64,
    pub length_bonus_cap: f64,
    /// Bonus per repeat occurrence of the keyword in the same line.
    pub density_bonus_per_repeat: f64,
    pub density_bonus_cap: f64,
    /// File-level variant: weight of each filename hit.
    pub filename_hit_weight: f64,
    /// File-level variant: weight of each content hit.
    pub content_hit_weight: f64,
    /// File-level variant: per-hit count bonus and its cap.
    pub filename_count_bonus: f64,
    pub filename_count_cap: f64,
    pub content_count_bonus: f64,
    pub content_count_cap: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base: 0.4,
            line_start_bonus: 0.2,
            early_position_bonus: 0.1,
            late_position_bonus: 0.05,
            context_line_bonus: 0.05,
            context_bonus_cap: 0.2,
            length_bonus_per_char: 0.001,
            length_bonus_cap: 0.1,
            density_bonus_per_repeat: 0.05,
            density_bonus_cap: 0.15,
            filename_hit_weight: 0.5,
            content_hit_weight: 0.2,
            filename_count_bonus: 0.1,
            filename_count_cap: 0.3,
            content_count_bonus: 0.05,
            content_count_cap: 0.2,
        }
    }
}

impl ScoringConfig {
    /// Validate that every constant is a sane non-negative weight.
    pub fn validate(&self) -> anyhow::Result<()> {
        let weights = [
            self.base,
            self.line_start_bonus,
            self.early_position_bonus,
            self.late_position_bonus,
            self.context_line_bonus,
            self.context_bonus_cap,
            self.length_bonus_per_char,
            self.length_bonus_cap,
            self.density_bonus_per_repeat,
            self.density_bonus_cap,
            self.filename_hit_weight,
            self.content_hit_weight,
            self.filename_count_bonus,
            self.filename_count_cap,
            self.content_count_bonus,
            self.content_count_cap,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            anyhow::bail!("[scoring] weights must be finite and non-negative");
        }
        Ok(())
    }
}

/// Score a single content match.
///
/// `match_start` is the byte offset of the match within `line`;
/// positions and lengths are measured in characters so multi-byte text
/// scores the same as ASCII. The returned score is clamped to 1.0.
pub fn score_match(
    cfg: &ScoringConfig,
    line: &str,
    match_start: usize,
    occurrences: usize,
    context_before: usize,
    context_after: usize,
) -> Relevance {
    let line_chars = line.chars().count();
    let start_col = line[..match_start].chars().count();

    let position_bonus = if start_col == 0 {
        cfg.line_start_bonus
    } else if (start_col as f64) < line_chars as f64 * 0.3 {
        cfg.early_position_bonus
    } else if (start_col as f64) > line_chars as f64 * 0.7 {
        cfg.late_position_bonus
    } else {
        0.0
    };

    let context_bonus = (((context_before + context_after) as f64) * cfg.context_line_bonus)
        .min(cfg.context_bonus_cap);

    let length_bonus = (line_chars as f64 * cfg.length_bonus_per_char).min(cfg.length_bonus_cap);

    let density_bonus = if occurrences > 1 {
        ((occurrences - 1) as f64 * cfg.density_bonus_per_repeat).min(cfg.density_bonus_cap)
    } else {
        0.0
    };

    let total = cfg.base + position_bonus + context_bonus + length_bonus + density_bonus;

    Relevance {
        score: total.min(1.0),
        position_bonus,
        context_bonus,
        length_bonus,
        density_bonus,
    }
}

/// Score a file located by the file-level search from its hit counts.
///
/// Filename hits dominate; both hit-count bonuses saturate so one file
/// stuffed with repeats cannot run away from the rest.
pub fn score_file(cfg: &ScoringConfig, filename_hits: usize, content_hits: usize) -> f64 {
    if filename_hits == 0 && content_hits == 0 {
        return 0.0;
    }

    let mut score = filename_hits as f64 * cfg.filename_hit_weight
        + content_hits as f64 * cfg.content_hit_weight;

    if filename_hits > 0 {
        score += (filename_hits as f64 * cfg.filename_count_bonus).min(cfg.filename_count_cap);
    }
    if content_hits > 0 {
        score += (content_hits as f64 * cfg.content_count_bonus).min(cfg.content_count_cap);
    }

    score.min(1.0)
}

/// Arithmetic mean of match scores, rounded to three decimals.
pub fn average_score(matches: &[crate::models::ContentMatch]) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }
    let sum: f64 = matches.iter().map(|m| m.relevance.score).sum();
    round3(sum / matches.len() as f64)
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
