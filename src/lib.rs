//! # kbsearch
//!
//! Keyword search tools over a local knowledge-base directory.
//!
//! kbsearch performs a fresh, synchronous-per-request scan over a
//! directory of heterogeneous documents (plain text, markdown, source,
//! PDF, DOCX): it locates candidate files by name and type, extracts
//! normalized line content per format, matches literal keywords, builds
//! context windows around hits, scores relevance, and ranks everything
//! into a structured report. There is no persistent index; callers get
//! the current state of the directory every time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌───────────────┐
//! │ Locator  │──▶│ Extractor │──▶│ Matcher  │──▶│ Score + Rank  │
//! │ walkdir  │   │ txt/pdf/… │   │ literal  │   │ → SearchReport │
//! └──────────┘   └───────────┘   └──────────┘   └───────┬───────┘
//!                 (per file, bounded worker pool)       │
//!                      ┌────────────────┬───────────────┤
//!                      ▼                ▼               ▼
//!                 ┌─────────┐     ┌──────────┐    ┌──────────┐
//!                 │   CLI   │     │   HTTP   │    │   MCP    │
//!                 │  (kbs)  │     │  (axum)  │    │ (stdio)  │
//!                 └─────────┘     └──────────┘    └──────────┘
//! ```
//!
//! ## Quick start
//!
//! ```bash
//! kbs --root ~/knowledge files "deploy config"
//! kbs --root ~/knowledge content "deploy config" --file "runbook*"
//! kbs --config ./config/kbs.toml serve mcp
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Request, match, and report types |
//! | [`locate`] | Candidate file discovery |
//! | [`extract`] | Per-format line extraction |
//! | [`matcher`] | Literal keyword matchers |
//! | [`context`] | Context windows around matches |
//! | [`score`] | Relevance scoring |
//! | [`report`] | Ranking, statistics, recommendations |
//! | [`search`] | The search core (both variants) |
//! | [`tools`] | Tool trait, registry, built-in tools |
//! | [`server`] | JSON HTTP API |
//! | [`mcp`] | MCP stdio server |

pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod locate;
pub mod matcher;
pub mod mcp;
pub mod models;
pub mod report;
pub mod score;
pub mod search;
pub mod server;
pub mod tools;
