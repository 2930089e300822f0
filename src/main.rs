//! # kbsearch CLI (`kbs`)
//!
//! The `kbs` binary fronts the same search core the MCP and HTTP servers
//! expose. Reports print as pretty JSON so the CLI output matches the
//! tool payloads byte for byte.
//!
//! ## Usage
//!
//! ```bash
//! kbs --config ./config/kbs.toml <command>
//! kbs --root ~/knowledge <command>        # defaults, no config file
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kbs files "<keywords>"` | Find files by name/content keywords |
//! | `kbs content "<keywords>" --file <pattern>` | Extract matching passages |
//! | `kbs time` | Print the server's current time |
//! | `kbs serve http` | Start the JSON HTTP API |
//! | `kbs serve mcp` | Start the MCP stdio server |

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kbsearch::config::{self, Config};
use kbsearch::models::{ContentSearchRequest, ErrorReport, FileSearchRequest};
use kbsearch::search::{self, SearchConfig};
use kbsearch::tools::{CurrentTimeTool, Tool, ToolContext};
use kbsearch::{mcp, server};

/// Knowledge-base search — keyword search tools over a local document
/// directory, served as MCP tools, a JSON HTTP API, and this CLI.
#[derive(Parser)]
#[command(
    name = "kbs",
    about = "Keyword search over a local knowledge-base directory",
    version,
    long_about = "kbsearch scans a directory of heterogeneous documents (text, markdown, \
    source, PDF, DOCX) per request — no persistent index — and reports keyword matches \
    with context windows and relevance scores. The same core is exposed as MCP tools, \
    a JSON HTTP API, and this CLI."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kbs.toml")]
    config: PathBuf,

    /// Knowledge root directory; overrides the config file and makes it
    /// optional.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find files whose name or content matches the keywords.
    Files {
        /// Whitespace-separated keywords.
        keywords: String,

        /// Restrict to these extensions (repeatable), e.g. `--type .md`.
        #[arg(long = "type")]
        file_types: Vec<String>,

        /// Maximum files returned.
        #[arg(long, default_value_t = 20)]
        max_results: usize,

        /// Match file names only, skip contents.
        #[arg(long)]
        names_only: bool,

        /// Match keywords case-sensitively.
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Extract keyword-matching passages with context from selected files.
    Content {
        /// Whitespace-separated keywords.
        keywords: String,

        /// File-name pattern (repeatable): a substring, or a glob when it
        /// contains `*`.
        #[arg(long = "file", required = true)]
        file_names: Vec<String>,

        /// Context lines on each side of a match.
        #[arg(long, default_value_t = 3)]
        context_lines: usize,

        /// Maximum matches returned per file.
        #[arg(long, default_value_t = 10)]
        max_results_per_file: usize,

        /// Match keywords case-sensitively.
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Print the server's current time (same payload as the MCP tool).
    Time,

    /// Start a server exposing the search tools.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Server transports.
#[derive(Subcommand)]
enum ServeService {
    /// JSON HTTP API on the configured bind address.
    Http,
    /// MCP protocol over stdio, for Claude Desktop and similar clients.
    Mcp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    match cli.command {
        Commands::Files {
            keywords,
            file_types,
            max_results,
            names_only,
            case_sensitive,
        } => {
            let req = FileSearchRequest {
                keywords,
                file_types: if file_types.is_empty() {
                    None
                } else {
                    Some(file_types)
                },
                max_results,
                search_content: !names_only,
                case_sensitive,
            };
            let search_cfg = SearchConfig::from_config(&cfg);
            match search::search_files(&search_cfg, &req).await {
                Ok(report) => print_json(&report)?,
                Err(err) => {
                    print_json(&ErrorReport::from(&err))?;
                    std::process::exit(1);
                }
            }
        }
        Commands::Content {
            keywords,
            file_names,
            context_lines,
            max_results_per_file,
            case_sensitive,
        } => {
            let req = ContentSearchRequest {
                file_names,
                keywords,
                context_lines,
                case_sensitive,
                max_results_per_file,
            };
            let search_cfg = SearchConfig::from_config(&cfg);
            match search::search_content(&search_cfg, &req).await {
                Ok(report) => print_json(&report)?,
                Err(err) => {
                    print_json(&ErrorReport::from(&err))?;
                    std::process::exit(1);
                }
            }
        }
        Commands::Time => {
            let ctx = ToolContext::new(std::sync::Arc::new(cfg));
            let payload = CurrentTimeTool
                .execute(serde_json::json!({}), &ctx)
                .await?;
            print_json(&payload)?;
        }
        Commands::Serve { service } => match service {
            ServeService::Http => {
                server::run_server(&cfg).await?;
            }
            ServeService::Mcp => {
                mcp::run_stdio_server(&cfg).await?;
            }
        },
    }

    Ok(())
}

/// Load the TOML config, or fall back to defaults when `--root` makes a
/// config file unnecessary.
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else if let Some(root) = &cli.root {
        Config::with_root(root.clone())
    } else {
        anyhow::bail!(
            "no config file at {} and no --root given; pass one of them",
            cli.config.display()
        );
    };

    if let Some(root) = &cli.root {
        cfg.knowledge.root = root.clone();
    }

    Ok(cfg)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered =
        serde_json::to_string_pretty(value).with_context(|| "Failed to render report")?;
    println!("{}", rendered);
    Ok(())
}
