//! Tool extension system.
//!
//! Every operation exposed to agents is a [`Tool`] registered in a
//! [`ToolRegistry`]. The HTTP server dispatches `POST /tools/{name}` and the
//! MCP bridge dispatches `call_tool` through the same registry.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  ┌──────────────────┐ ┌──────────────┐   │
//! │  │ Built-in         │ │  Custom      │   │
//! │  │ read_wiki_*      │ │  (Rust)      │   │
//! │  └──────────────────┘ └──────────────┘   │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!       REST /tools/{name}  +  MCP /mcp
//! ```
//!
//! # Usage
//!
//! ```rust
//! use autodoc_gateway::traits::ToolRegistry;
//!
//! let mut tools = ToolRegistry::with_builtins();
//! // tools.register(Box::new(MyTool::new()));
//! assert_eq!(tools.len(), 2);
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::lookup::LookupService;

/// Longest `topic` or `repo_url` accepted by the built-in tools.
pub const MAX_INPUT_LEN: usize = 1000;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that agents can discover and call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use autodoc_gateway::traits::{Tool, ToolContext};
///
/// pub struct BackendInfoTool;
///
/// #[async_trait]
/// impl Tool for BackendInfoTool {
///     fn name(&self) -> &str { "backend_info" }
///     fn description(&self) -> &str { "Show the configured documentation backend" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         Ok(json!({ "base_url": ctx.lookup().backend().base_url() }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores, used as the route path.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    /// Whether this tool ships with the crate. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) describing the parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute with validated parameters (always a JSON object).
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Serializable tool descriptor for `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub parameters: Value,
}

impl ToolInfo {
    pub fn from_tool(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            builtin: tool.is_builtin(),
            parameters: tool.parameters_schema(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// What a tool can reach while executing. Created per invocation.
pub struct ToolContext {
    config: Arc<Config>,
    lookup: LookupService,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, lookup: LookupService) -> Self {
        Self { config, lookup }
    }

    pub fn lookup(&self) -> &LookupService {
        &self.lookup
    }

    /// The `repo_url` param if given, otherwise `mcp.default_repo_url`.
    fn repo_url(&self, params: &Value) -> Result<String> {
        let explicit = params
            .get("repo_url")
            .and_then(|v| v.as_str())
            .map(|s| sanitize_input(s, MAX_INPUT_LEN))
            .filter(|s| !s.is_empty());

        match explicit.or_else(|| self.config.mcp.default_repo_url.clone()) {
            Some(url) => Ok(url),
            None => bail!("repo_url must not be empty: pass it or configure REPO_URL"),
        }
    }
}

/// Trim and cap an agent-supplied string at `max_len` characters.
pub fn sanitize_input(value: &str, max_len: usize) -> String {
    value.trim().chars().take(max_len).collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tools
// ═══════════════════════════════════════════════════════════════════════

/// Built-in wiki structure tool. Delegates to [`LookupService::wiki_structure`].
pub struct ReadWikiStructureTool;

#[async_trait]
impl Tool for ReadWikiStructureTool {
    fn name(&self) -> &str {
        "read_wiki_structure"
    }

    fn description(&self) -> &str {
        "Retrieve the documentation structure (page index) generated for a repository. \
         Use this first to see which topics are available."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "repo_url": {
                    "type": "string",
                    "description": "Repository URL or local path. Defaults to the configured repository."
                }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let repo_url = ctx.repo_url(&params)?;
        let structure = ctx.lookup.wiki_structure(Some(&repo_url)).await?;
        Ok(structure)
    }
}

/// Built-in page content tool. Delegates to [`LookupService::wiki_content`].
pub struct ReadWikiContentsTool;

#[async_trait]
impl Tool for ReadWikiContentsTool {
    fn name(&self) -> &str {
        "read_wiki_contents"
    }

    fn description(&self) -> &str {
        "Retrieve one documentation page by page id (e.g. \"page-1\") or title \
         (case-insensitive, e.g. \"Getting Started\")."
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": { "type": "string", "description": "Page id or page title" },
                "repo_url": {
                    "type": "string",
                    "description": "Repository URL or local path. Defaults to the configured repository."
                }
            },
            "required": ["topic"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let topic = sanitize_input(params["topic"].as_str().unwrap_or(""), MAX_INPUT_LEN);
        if topic.is_empty() {
            bail!("topic must not be empty");
        }

        let repo_url = ctx.repo_url(&params)?;
        let page = ctx
            .lookup
            .wiki_content(Some(&repo_url), Some(&topic))
            .await?;
        Ok(page)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Parameter validation
// ═══════════════════════════════════════════════════════════════════════

/// Check `params` against a tool's schema: required keys present, declared
/// types respected. Defaults from the schema are filled in.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let params_obj = match params {
        Value::Object(map) => map.clone(),
        Value::Null => serde_json::Map::new(),
        other => bail!(
            "parameters must be a JSON object, got {}",
            json_type_name(other)
        ),
    };

    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .cloned()
        .unwrap_or_default();

    let required: Vec<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    for field in &required {
        if !params_obj.contains_key(*field) {
            bail!("missing required parameter: {}", field);
        }
    }

    let mut result = params_obj.clone();

    for (prop_name, prop_schema) in &properties {
        match params_obj.get(prop_name) {
            Some(value) => {
                if let Some(expected) = prop_schema.get("type").and_then(|t| t.as_str()) {
                    let type_ok = match expected {
                        "string" => value.is_string(),
                        "integer" => value.is_i64() || value.is_u64(),
                        "number" => value.is_number(),
                        "boolean" => value.is_boolean(),
                        "array" => value.is_array(),
                        "object" => value.is_object(),
                        _ => true,
                    };
                    if !type_ok {
                        bail!(
                            "invalid parameter '{}': expected {}, got {}",
                            prop_name,
                            expected,
                            json_type_name(value)
                        );
                    }
                }
            }
            None => {
                if let Some(default) = prop_schema.get("default") {
                    result.insert(prop_name.clone(), default.clone());
                }
            }
        }
    }

    Ok(Value::Object(result))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry for tools (built-in and custom Rust).
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry with `read_wiki_structure` and `read_wiki_contents`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ReadWikiStructureTool));
        registry.register(Box::new(ReadWikiContentsTool));
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
    use crate::backend::BackendClient;
    use serde_json::json;

    fn offline_ctx(default_repo: Option<&str>) -> ToolContext {
        let mut config = Config::default();
        config.mcp.default_repo_url = default_repo.map(|s| s.to_string());
        ToolContext::new(
            Arc::new(config),
            LookupService::with_backend(BackendClient::new("http://127.0.0.1:9")),
        )
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 2);
        assert!(registry.find("read_wiki_structure").is_some());
        assert!(registry.find("read_wiki_contents").unwrap().is_builtin());
        assert!(registry.find("ask_question").is_none());
    }

    #[test]
    fn test_sanitize_trims_and_truncates() {
        assert_eq!(sanitize_input("  intro \n", 1000), "intro");
        assert_eq!(sanitize_input(&"x".repeat(1500), MAX_INPUT_LEN).len(), 1000);
        assert_eq!(sanitize_input("héllo", 2), "hé");
    }

    #[test]
    fn test_validate_required_and_types() {
        let schema = ReadWikiContentsTool.parameters_schema();

        let err = validate_params(&schema, &json!({})).unwrap_err();
        assert!(err.to_string().contains("missing required parameter: topic"));

        let err = validate_params(&schema, &json!({ "topic": 3 })).unwrap_err();
        assert!(err.to_string().contains("invalid parameter 'topic'"));

        let ok = validate_params(&schema, &json!({ "topic": "intro" })).unwrap();
        assert_eq!(ok["topic"], "intro");
    }

    #[test]
    fn test_validate_null_params_is_empty_object() {
        let schema = ReadWikiStructureTool.parameters_schema();
        assert_eq!(validate_params(&schema, &Value::Null).unwrap(), json!({}));
        assert!(validate_params(&schema, &json!([1])).is_err());
    }

    #[test]
    fn test_repo_url_falls_back_to_default() {
        let ctx = offline_ctx(Some("https://github.com/acme/widgets"));
        assert_eq!(
            ctx.repo_url(&json!({})).unwrap(),
            "https://github.com/acme/widgets"
        );
        assert_eq!(
            ctx.repo_url(&json!({ "repo_url": " https://gitlab.com/x/y " }))
                .unwrap(),
            "https://gitlab.com/x/y"
        );
    }

    #[test]
    fn test_repo_url_required_without_default() {
        let ctx = offline_ctx(None);
        let err = ctx.repo_url(&json!({ "repo_url": "  " })).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[tokio::test]
    async fn test_contents_rejects_blank_topic() {
        let ctx = offline_ctx(Some("https://github.com/acme/widgets"));
        let err = ReadWikiContentsTool
            .execute(json!({ "topic": "   " }), &ctx)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "topic must not be empty");
    }
}
