//! The tool bridge.
//!
//! Every transport (the HTTP API, the MCP server, the CLI) dispatches
//! into the same [`ToolRegistry`]. A tool receives JSON parameters and a
//! [`ToolContext`] and returns a JSON payload. Request rejection is part
//! of the payload contract (`success: false` with an error code), not a
//! transport error, so every surface reports failures identically.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::models::{
    ContentSearchReport, ContentSearchRequest, ErrorReport, FileSearchReport, FileSearchRequest,
};
use crate::search::{self, SearchConfig};

/// A tool agents can discover and call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier; also the HTTP route (`POST /tools/{name}`).
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// JSON Schema for the parameters object.
    fn parameters_schema(&self) -> Value;

    /// Execute with raw JSON parameters.
    ///
    /// Domain failures (bad query, missing directory) are reported inside
    /// the returned payload; `Err` is reserved for internal faults.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Shared state handed to executing tools.
pub struct ToolContext {
    config: Arc<Config>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::from_config(&self.config)
    }

    /// Run the file-level search and shape the outcome as a payload.
    pub async fn search_files(&self, req: &FileSearchRequest) -> Result<Value> {
        let report: Result<FileSearchReport, _> =
            search::search_files(&self.search_config(), req).await;
        match report {
            Ok(report) => Ok(serde_json::to_value(report)?),
            Err(err) => Ok(serde_json::to_value(ErrorReport::from(&err))?),
        }
    }

    /// Run the content-level search and shape the outcome as a payload.
    pub async fn search_content(&self, req: &ContentSearchRequest) -> Result<Value> {
        let report: Result<ContentSearchReport, _> =
            search::search_content(&self.search_config(), req).await;
        match report {
            Ok(report) => Ok(serde_json::to_value(report)?),
            Err(err) => Ok(serde_json::to_value(ErrorReport::from(&err))?),
        }
    }
}

fn invalid_request(err: impl std::fmt::Display) -> Result<Value> {
    Ok(serde_json::to_value(ErrorReport::new(
        "invalid_request",
        format!("invalid parameters: {}", err),
    ))?)
}

// ─── Built-in tools ─────────────────────────────────────────────────────

/// Find knowledge-base files by keywords in their name or content.
pub struct SearchKnowledgeFileTool;

#[async_trait]
impl Tool for SearchKnowledgeFileTool {
    fn name(&self) -> &str {
        "search_knowledge_file"
    }

    fn description(&self) -> &str {
        "Search the knowledge base for files matching keywords, by file name and optionally content"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keywords": {
                    "type": "string",
                    "description": "Whitespace-separated search keywords"
                },
                "file_types": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Extension allowlist, e.g. [\".md\", \".pdf\"]"
                },
                "max_results": { "type": "integer", "default": 20 },
                "search_content": { "type": "boolean", "default": true },
                "case_sensitive": { "type": "boolean", "default": false }
            },
            "required": ["keywords"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let req: FileSearchRequest = match serde_json::from_value(params) {
            Ok(req) => req,
            Err(err) => return invalid_request(err),
        };
        ctx.search_files(&req).await
    }
}

/// Extract matching passages with context from selected files.
pub struct SearchKnowledgeContentTool;

#[async_trait]
impl Tool for SearchKnowledgeContentTool {
    fn name(&self) -> &str {
        "search_knowledge_content"
    }

    fn description(&self) -> &str {
        "Extract keyword-matching passages with surrounding context from knowledge-base files"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_names": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "File-name patterns: substrings, or globs containing *"
                },
                "keywords": {
                    "type": "string",
                    "description": "Whitespace-separated search keywords"
                },
                "context_lines": { "type": "integer", "default": 3 },
                "case_sensitive": { "type": "boolean", "default": false },
                "max_results_per_file": { "type": "integer", "default": 10 }
            },
            "required": ["file_names", "keywords"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let req: ContentSearchRequest = match serde_json::from_value(params) {
            Ok(req) => req,
            Err(err) => return invalid_request(err),
        };
        ctx.search_content(&req).await
    }
}

/// Server-local current time.
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Return the server's current date and time"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _params: Value, _ctx: &ToolContext) -> Result<Value> {
        let now = chrono::Local::now();
        Ok(json!({
            "current_time": now.format("%Y-%m-%d %H:%M:%S").to_string(),
            "timestamp": now.timestamp() as f64
                + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0,
            "formatted_date": now.format("%Y-%m-%d").to_string(),
            "formatted_time": now.format("%H:%M:%S").to_string(),
            "timezone": now.offset().to_string(),
        }))
    }
}

// ─── Registry ───────────────────────────────────────────────────────────

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// A registry pre-loaded with the built-in tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchKnowledgeFileTool));
        registry.register(Box::new(SearchKnowledgeContentTool));
        registry.register(Box::new(CurrentTimeTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_for(dir: &tempfile::TempDir) -> ToolContext {
        ToolContext::new(Arc::new(Config::with_root(dir.path())))
    }

    #[test]
    fn registry_finds_builtins() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 3);
        assert!(registry.find("search_knowledge_file").is_some());
        assert!(registry.find("search_knowledge_content").is_some());
        assert!(registry.find("get_current_time").is_some());
        assert!(registry.find("nonexistent").is_none());
    }

    #[tokio::test]
    async fn content_tool_reports_success_payload() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.md"), "deploy the service\n").unwrap();

        let result = SearchKnowledgeContentTool
            .execute(
                json!({ "file_names": ["notes"], "keywords": "deploy" }),
                &ctx_for(&dir),
            )
            .await
            .unwrap();

        assert_eq!(result["success"], json!(true));
        assert_eq!(result["statistics"]["total_matches_found"], json!(1));
    }

    #[tokio::test]
    async fn empty_keywords_become_error_payload() {
        let dir = tempfile::TempDir::new().unwrap();

        let result = SearchKnowledgeContentTool
            .execute(
                json!({ "file_names": ["notes"], "keywords": "   " }),
                &ctx_for(&dir),
            )
            .await
            .unwrap();

        assert_eq!(result["success"], json!(false));
        assert_eq!(result["error"], json!("empty_keywords"));
        assert!(!result["message"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_params_become_error_payload() {
        let dir = tempfile::TempDir::new().unwrap();

        let result = SearchKnowledgeFileTool
            .execute(json!({ "max_results": "not-a-number" }), &ctx_for(&dir))
            .await
            .unwrap();

        assert_eq!(result["success"], json!(false));
        assert_eq!(result["error"], json!("invalid_request"));
    }

    #[tokio::test]
    async fn time_tool_returns_all_fields() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = CurrentTimeTool
            .execute(json!({}), &ctx_for(&dir))
            .await
            .unwrap();

        for field in [
            "current_time",
            "timestamp",
            "formatted_date",
            "formatted_time",
            "timezone",
        ] {
            assert!(result.get(field).is_some(), "missing field {}", field);
        }
    }
}
