use std::sync::Arc;

use adctx_orchestrator::MemoryOrchestrator;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::{
    JsonRpcRequest, JsonRpcResponse, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND,
};
use crate::session::SessionRegistry;
use crate::tools::{tools_list_result, AddMemoryArgs, SearchMemoryArgs, Tool};

pub const SERVER_NAME: &str = "AD-Context";

/// Per-request transport facts the dispatcher needs.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session_id: Option<String>,
    pub protocol_version: &'static str,
}

/// Result of dispatching one envelope. `response` is `None` for notifications.
#[derive(Debug)]
pub struct Dispatch {
    pub response: Option<JsonRpcResponse>,
    pub session_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),
    #[error("invalid tool arguments: {0}")]
    InvalidArguments(String),
    #[error("Tool execution error: {0}")]
    Execution(#[from] serde_json::Error),
}

impl ToolError {
    pub const fn code(&self) -> i64 {
        match self {
            Self::NotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidArguments(_) => INVALID_PARAMS,
            Self::Execution(_) => INTERNAL_ERROR,
        }
    }
}

pub struct McpServer {
    orchestrator: Arc<MemoryOrchestrator>,
    sessions: Arc<SessionRegistry>,
}

impl McpServer {
    pub fn new(orchestrator: Arc<MemoryOrchestrator>, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            orchestrator,
            sessions,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    pub fn orchestrator(&self) -> &Arc<MemoryOrchestrator> {
        &self.orchestrator
    }

    pub async fn handle_request(&self, request: JsonRpcRequest, ctx: &RequestContext) -> Dispatch {
        let mut session_id = ctx.session_id.clone();

        if !request.has_valid_version() {
            return Dispatch {
                response: Some(JsonRpcResponse::error(
                    request.id.unwrap_or(Value::Null),
                    INVALID_REQUEST,
                    "invalid jsonrpc version",
                )),
                session_id,
            };
        }

        if request.is_notification() {
            debug!(method = %request.method, "notification acknowledged");
            return Dispatch {
                response: None,
                session_id,
            };
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let response = match request.method.as_str() {
            "initialize" => {
                let id_for_session = self.initialize_session(ctx);
                session_id = Some(id_for_session);
                JsonRpcResponse::success(id, initialize_result(ctx.protocol_version))
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, tools_list_result()),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            other => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
        };

        Dispatch {
            response: Some(response),
            session_id,
        }
    }

    /// Reuses the caller's session when it is still registered, recording the
    /// newly negotiated version on it, otherwise mints a new one.
    fn initialize_session(&self, ctx: &RequestContext) -> String {
        if let Some(existing) = ctx.session_id.as_deref() {
            if self.sessions.renegotiate(existing, ctx.protocol_version) {
                return existing.to_string();
            }
        }
        self.sessions.create(ctx.protocol_version).id
    }

    async fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let parsed: ToolsCallParams = match serde_json::from_value(params) {
            Ok(v) => v,
            Err(err) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("invalid params: {err}"));
            }
        };

        match self.call_tool(&parsed.name, parsed.arguments).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                warn!(tool = %parsed.name, error = %err, "tool call rejected");
                JsonRpcResponse::error(id, err.code(), err.to_string())
            }
        }
    }

    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<Value, ToolError> {
        let tool = Tool::from_name(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        match tool {
            Tool::AddMemory => {
                let args: AddMemoryArgs = parse_args(arguments)?;
                Ok(match self.orchestrator.add(&args.text).await {
                    Ok(report) => text_result(&report.status(), !report.is_success()),
                    Err(err) => {
                        warn!(error = %err, "add_memory failed");
                        text_result(&format!("Error adding memory: {err}"), true)
                    }
                })
            }
            Tool::SearchMemory => {
                let args: SearchMemoryArgs = parse_args(arguments)?;
                match self.orchestrator.search(&args.query_text, args.top_k).await {
                    Ok(report) => {
                        let body = serde_json::to_string_pretty(&report)?;
                        Ok(text_result(&body, false))
                    }
                    Err(err) => {
                        warn!(error = %err, "search_memory failed");
                        Ok(text_result(&format!("Error searching memories: {err}"), true))
                    }
                }
            }
        }
    }
}

fn initialize_result(protocol_version: &str) -> Value {
    json!({
        "protocolVersion": protocol_version,
        "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
        "capabilities": {
            "tools": {"listChanged": false},
            "resources": {"subscribe": false, "listChanged": false},
            "prompts": {"listChanged": false},
            "logging": {}
        }
    })
}

fn text_result(text: &str, is_error: bool) -> Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "isError": is_error
    })
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Option<Value>) -> Result<T, ToolError> {
    let Some(args) = arguments else {
        return Err(ToolError::InvalidArguments("missing tool arguments".to_string()));
    };
    serde_json::from_value(args).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct ToolsCallParams {
    name: String,
    arguments: Option<Value>,
}
