//! MCP surface for the privacy-gated memory tools: JSON-RPC dispatch, the
//! session registry, the HTTP/SSE endpoint and the escrow peer socket.

pub mod config;
pub mod http;
pub mod peer;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;

pub use config::{build_orchestrator, ServerConfig, StartupError};
pub use http::{router, AppState};
pub use server::{McpServer, RequestContext, ToolError};
pub use session::SessionRegistry;
