//! MCP JSON-RPC protocol bridge.
//!
//! Exposes the [`ToolRegistry`] as MCP tools over the Streamable HTTP
//! transport so that Cursor, Claude and other MCP clients can browse
//! generated repository documentation.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler};
use serde_json::json;

use crate::config::Config;
use crate::lookup::{LookupError, LookupService};
use crate::traits::{validate_params, ToolContext, ToolRegistry};

/// Bridges the tool registry to the MCP protocol.
///
/// Each MCP session receives a clone; everything heavy is behind `Arc`.
#[derive(Clone)]
pub struct McpBridge {
    config: Arc<Config>,
    lookup: LookupService,
    tools: Arc<ToolRegistry>,
}

impl McpBridge {
    pub fn new(config: Arc<Config>, lookup: LookupService, tools: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            lookup,
            tools,
        }
    }

    /// Convert a registry tool into an rmcp `Tool` descriptor.
    fn to_mcp_tool(tool: &dyn crate::traits::Tool) -> Tool {
        let input_schema: Arc<serde_json::Map<String, serde_json::Value>> =
            match tool.parameters_schema() {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

        Tool {
            name: Cow::Owned(tool.name().to_string()),
            title: None,
            description: Some(Cow::Owned(tool.description().to_string())),
            input_schema,
            output_schema: None,
            annotations: Some(ToolAnnotations::new().read_only(true)),
            execution: None,
            icons: None,
            meta: None,
        }
    }
}

/// Structured error payload returned to MCP clients as tool output.
pub fn tool_failure_payload(tool_name: &str, err: &anyhow::Error) -> serde_json::Value {
    let operation = match tool_name {
        "read_wiki_structure" => "fetch wiki structure".to_string(),
        "read_wiki_contents" => "fetch wiki content".to_string(),
        other => format!("run {}", other),
    };

    match err.downcast_ref::<LookupError>() {
        Some(LookupError::Backend { status, body, .. }) => json!({
            "error": format!("HTTP {}", status),
            "message": format!("Failed to {}", operation),
            "details": String::from_utf8_lossy(body),
        }),
        Some(LookupError::BackendUnavailable(e)) => json!({
            "error": "connection_error",
            "message": format!("Unable to reach the documentation backend during {}", operation),
            "details": e.to_string(),
        }),
        Some(e) if e.is_not_found() => json!({
            "error": "not_found",
            "message": format!("Failed to {}", operation),
            "details": e.to_string(),
        }),
        _ => json!({
            "error": "invalid_input",
            "message": format!("Failed to {}", operation),
            "details": err.to_string(),
        }),
    }
}

impl ServerHandler for McpBridge {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "autodoc".to_string(),
                title: Some("AutoDoc".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "AutoDoc serves AI-generated documentation for code repositories. \
                 Call read_wiki_structure first to list the available pages, then \
                 read_wiki_contents with a page id or title to read one."
                    .to_string(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools: Vec<Tool> = self
            .tools
            .tools()
            .iter()
            .map(|t| Self::to_mcp_tool(t.as_ref()))
            .collect();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    fn get_tool(&self, name: &str) -> Option<Tool> {
        self.tools.find(name).map(Self::to_mcp_tool)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool = self.tools.find(&request.name).ok_or_else(|| {
            McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("no tool registered with name: {}", request.name),
                None,
            )
        })?;

        let params = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or(serde_json::Value::Object(serde_json::Map::new()));
        let params = validate_params(&tool.parameters_schema(), &params)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        tracing::info!(tool = %request.name, "mcp tool call");

        let ctx = ToolContext::new(self.config.clone(), self.lookup.clone());
        match tool.execute(params, &ctx).await {
            Ok(result) => {
                let text = serde_json::to_string_pretty(&result).unwrap_or_default();
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                tracing::warn!(tool = %request.name, error = %e, "mcp tool call failed");
                let payload = tool_failure_payload(&request.name, &e);
                let text = serde_json::to_string_pretty(&payload).unwrap_or_default();
                Ok(CallToolResult::error(vec![Content::text(text)]))
            }
        }
    }
}
