//! HTTP surface: the `/mcp` endpoint with its session and streaming rules,
//! plus the side endpoints and the duplex peer upgrade.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use adctx_broker::CorrelationBroker;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCEPT, ORIGIN};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Uri};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::stream::{self, Stream};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::peer;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, INVALID_REQUEST, PARSE_ERROR};
use crate::server::{McpServer, RequestContext};
use crate::session::{
    negotiate_version, now_ms, SessionRegistry, DEFAULT_PROTOCOL_VERSION,
    SUPPORTED_PROTOCOL_VERSIONS,
};

pub const SESSION_HEADER: &str = "mcp-session-id";
pub const PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";
pub const LAST_EVENT_ID_HEADER: &str = "last-event-id";

const EVENT_STREAM: &str = "text/event-stream";
const ALLOWED_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

#[derive(Clone)]
pub struct AppState {
    server: Arc<McpServer>,
    broker: Arc<CorrelationBroker>,
    heartbeat: Duration,
}

impl AppState {
    pub fn new(server: Arc<McpServer>, broker: Arc<CorrelationBroker>, heartbeat: Duration) -> Self {
        Self {
            server,
            broker,
            heartbeat: heartbeat.max(Duration::from_millis(1)),
        }
    }

    pub fn broker(&self) -> &Arc<CorrelationBroker> {
        &self.broker
    }

    fn sessions(&self) -> &Arc<SessionRegistry> {
        self.server.sessions()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", get(mcp_get).post(mcp_post).delete(mcp_delete))
        .route("/sse", get(legacy_sse))
        .route("/sessions", get(list_sessions))
        .route("/health", get(health))
        .route("/ws", get(peer::upgrade))
        .with_state(state)
}

async fn mcp_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let protocol_version = match admit(&headers) {
        Ok(v) => v,
        Err(rejection) => return rejection,
    };
    let session_id = match known_session(&state, &headers) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };

    if body.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Empty request body");
    }
    let raw: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(err) => {
            debug!(error = %err, "rejecting unparseable body");
            return rpc_rejection(JsonRpcResponse::error(Value::Null, PARSE_ERROR, "Invalid JSON"));
        }
    };
    let request_id = raw.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(v) => v,
        Err(err) => {
            return rpc_rejection(JsonRpcResponse::error(
                request_id,
                INVALID_REQUEST,
                format!("invalid request: {err}"),
            ));
        }
    };

    let ctx = RequestContext {
        session_id,
        protocol_version,
    };
    let dispatch = state.server.handle_request(request, &ctx).await;
    let response_headers = session_headers(dispatch.session_id.as_deref());

    let Some(response) = dispatch.response else {
        return (StatusCode::ACCEPTED, response_headers, Json(json!({}))).into_response();
    };

    if wants_event_stream(&headers) {
        let frame = match serde_json::to_string(&response) {
            Ok(frame) => frame,
            Err(err) => {
                return json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("Internal server error: {err}"),
                );
            }
        };
        let single = stream::once(async move { Ok::<_, Infallible>(Event::default().data(frame)) });
        return (response_headers, Sse::new(single)).into_response();
    }

    (response_headers, Json(response)).into_response()
}

async fn mcp_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let protocol_version = match admit(&headers) {
        Ok(v) => v,
        Err(rejection) => return rejection,
    };
    let session_id = match known_session(&state, &headers) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    if !wants_event_stream(&headers) {
        return json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let start = resume_sequence(&headers);
    let established = json!({
        "type": "session_established",
        "session_id": session_id,
        "protocol_version": protocol_version,
    });
    let guard = session_id.clone().map(|id| ActivityGuard {
        sessions: Arc::clone(state.sessions()),
        session_id: id,
    });
    debug!(session_id = ?session_id, start, "event stream opened");

    let events = numbered_events(established, start, state.heartbeat, guard);
    (session_headers(session_id.as_deref()), Sse::new(events)).into_response()
}

async fn mcp_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(rejection) = admit(&headers) {
        return rejection;
    }
    let Some(session_id) = header_str(&headers, SESSION_HEADER) else {
        return json_error(StatusCode::BAD_REQUEST, "Session ID required");
    };
    if state.sessions().remove(session_id) {
        (StatusCode::OK, Json(json!({"message": "Session terminated"}))).into_response()
    } else {
        json_error(StatusCode::NOT_FOUND, "Session not found")
    }
}

/// Older callers open this stream first and learn where to POST.
async fn legacy_sse(headers: HeaderMap, State(state): State<AppState>) -> Response {
    if let Err(rejection) = admit(&headers) {
        return rejection;
    }
    let endpoint = json!({"type": "endpoint", "uri": "/mcp"});
    let events = numbered_events(endpoint, resume_sequence(&headers), state.heartbeat, None);
    Sse::new(events).into_response()
}

async fn list_sessions(State(state): State<AppState>) -> Json<Value> {
    let sessions = state.sessions().snapshot();
    Json(json!({
        "active_sessions": sessions.len(),
        "supported_versions": SUPPORTED_PROTOCOL_VERSIONS,
        "default_version": DEFAULT_PROTOCOL_VERSION,
        "sessions": sessions,
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "peer_connected": state.broker.peer_connected(),
        "store": state.server.orchestrator().store_mode().as_str(),
    }))
}

/// Origin check, then protocol-version negotiation. Either failure ends the
/// request before anything else is looked at.
fn admit(headers: &HeaderMap) -> Result<&'static str, Response> {
    if let Some(origin) = headers.get(ORIGIN) {
        if !origin.to_str().is_ok_and(origin_allowed) {
            warn!(origin = ?origin, "rejected request from foreign origin");
            return Err(json_error(StatusCode::FORBIDDEN, "Invalid origin"));
        }
    }
    let requested = headers
        .get(PROTOCOL_VERSION_HEADER)
        .map(|v| v.to_str().unwrap_or_default());
    negotiate_version(requested).map_err(|err| {
        debug!(error = %err, "rejected protocol version");
        json_error(StatusCode::BAD_REQUEST, "Unsupported protocol version")
    })
}

/// The session header, if present, must name a live session.
fn known_session(state: &AppState, headers: &HeaderMap) -> Result<Option<String>, Response> {
    let Some(id) = header_str(headers, SESSION_HEADER) else {
        return Ok(None);
    };
    if !state.sessions().touch(id) {
        return Err(json_error(StatusCode::NOT_FOUND, "Session not found or expired"));
    }
    Ok(Some(id.to_string()))
}

/// True when `origin` is an http(s) URL whose host, userinfo excluded, is a
/// loopback name.
pub fn origin_allowed(origin: &str) -> bool {
    let Ok(uri) = origin.parse::<Uri>() else {
        return false;
    };
    if !matches!(uri.scheme_str(), Some("http" | "https")) {
        return false;
    }
    uri.host().is_some_and(|host| {
        ALLOWED_HOSTS
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    })
}

fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(EVENT_STREAM))
}

/// First sequence number for a stream: one past `Last-Event-ID`, or zero.
pub fn resume_sequence(headers: &HeaderMap) -> u64 {
    header_str(headers, LAST_EVENT_ID_HEADER)
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map_or(0, |last| last.saturating_add(1))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn session_headers(session_id: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = session_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        headers.insert(HeaderName::from_static(SESSION_HEADER), value);
    }
    headers
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

fn rpc_rejection(response: JsonRpcResponse) -> Response {
    (StatusCode::BAD_REQUEST, Json(response)).into_response()
}

/// Touches the owning session when its stream is dropped.
struct ActivityGuard {
    sessions: Arc<SessionRegistry>,
    session_id: String,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.sessions.touch(&self.session_id);
        debug!(session_id = %self.session_id, "event stream closed");
    }
}

struct StreamState {
    seq: u64,
    first: Option<Value>,
    ticker: tokio::time::Interval,
    _guard: Option<ActivityGuard>,
}

fn numbered_events(
    first: Value,
    start: u64,
    heartbeat: Duration,
    guard: Option<ActivityGuard>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let state = StreamState {
        seq: start,
        first: Some(first),
        ticker: tokio::time::interval_at(tokio::time::Instant::now() + heartbeat, heartbeat),
        _guard: guard,
    };
    stream::unfold(state, |mut st| async move {
        let frame = match st.first.take() {
            Some(frame) => frame,
            None => {
                st.ticker.tick().await;
                json!({"type": "heartbeat", "timestamp": now_ms()})
            }
        };
        let event = Event::default().id(st.seq.to_string()).data(frame.to_string());
        st.seq = st.seq.saturating_add(1);
        Some((Ok(event), st))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_allow_list_matches_host_exactly() {
        for ok in [
            "http://localhost",
            "http://localhost:3000",
            "https://127.0.0.1:8443/app",
            "http://[::1]:1234",
        ] {
            assert!(origin_allowed(ok), "{ok} should pass");
        }
        for bad in [
            "http://localhost.evil.com",
            "http://127.0.0.1.nip.io",
            "https://example.com",
            "localhost",
            "null",
            "ftp://localhost",
            "http://localhost:1@evil.com",
            "http://localhost@evil.com:3000",
        ] {
            assert!(!origin_allowed(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn resume_advances_past_last_event_id() {
        let mut headers = HeaderMap::new();
        assert_eq!(resume_sequence(&headers), 0);
        headers.insert(LAST_EVENT_ID_HEADER, HeaderValue::from_static("41"));
        assert_eq!(resume_sequence(&headers), 42);
        headers.insert(LAST_EVENT_ID_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(resume_sequence(&headers), 0);
    }
}
