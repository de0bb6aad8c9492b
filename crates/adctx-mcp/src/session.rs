use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Used when a client sends no version header.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported protocol version: {0}")]
pub struct UnsupportedVersion(pub String);

/// Picks the protocol version for a request from its version header.
pub fn negotiate_version(header: Option<&str>) -> Result<&'static str, UnsupportedVersion> {
    let Some(requested) = header.map(str::trim) else {
        return Ok(DEFAULT_PROTOCOL_VERSION);
    };
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|v| *v == requested)
        .ok_or_else(|| UnsupportedVersion(requested.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    #[serde(skip)]
    pub id: String,
    pub created_at: u64,
    pub last_activity: u64,
    pub protocol_version: &'static str,
}

/// Process-wide table of live sessions. No expiry: sessions end on DELETE.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, protocol_version: &'static str) -> Session {
        let now = now_ms();
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            last_activity: now,
            protocol_version,
        };
        self.sessions
            .write()
            .insert(session.id.clone(), session.clone());
        info!(session_id = %session.id, protocol_version, "session created");
        session
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.read().contains_key(id)
    }

    /// Bumps `last_activity`, never moving it backwards. False if unknown.
    pub fn touch(&self, id: &str) -> bool {
        let now = now_ms();
        match self.sessions.write().get_mut(id) {
            Some(session) => {
                session.last_activity = session.last_activity.max(now);
                true
            }
            None => false,
        }
    }

    /// Records the version agreed by a repeated `initialize` on a live
    /// session and bumps `last_activity` in the same write. False if unknown.
    pub fn renegotiate(&self, id: &str, protocol_version: &'static str) -> bool {
        let now = now_ms();
        match self.sessions.write().get_mut(id) {
            Some(session) => {
                if session.protocol_version != protocol_version {
                    debug!(
                        session_id = id,
                        from = session.protocol_version,
                        to = protocol_version,
                        "protocol version renegotiated"
                    );
                }
                session.protocol_version = protocol_version;
                session.last_activity = session.last_activity.max(now);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            info!(session_id = id, "session terminated");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    pub fn snapshot(&self) -> HashMap<String, Session> {
        self.sessions.read().clone()
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
