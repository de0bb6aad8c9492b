use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::wire::{OperationResultPayload, RequestKind, ServerMessage};

pub type PeerId = u64;

/// Result of one correlated round-trip. `reply` is `None` when the peer did
/// not answer before the deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub request_id: String,
    pub reply: Option<OperationResultPayload>,
}

impl Exchange {
    pub fn succeeded(&self) -> bool {
        self.reply.as_ref().is_some_and(|r| r.success)
    }
}

/// The orchestrator's view of the broker.
#[async_trait]
pub trait EscrowChannel: Send + Sync {
    async fn issue_and_wait(&self, kind: RequestKind, payload: Value, timeout: Duration)
    -> Exchange;

    fn peer_connected(&self) -> bool;
}

struct Peer {
    id: PeerId,
    outbound: mpsc::UnboundedSender<String>,
}

/// One peer slot plus a table of single-use pending replies keyed by
/// correlation id. The last connected peer wins.
#[derive(Default)]
pub struct CorrelationBroker {
    peer: RwLock<Option<Peer>>,
    pending: Mutex<HashMap<String, oneshot::Sender<OperationResultPayload>>>,
    next_peer_id: AtomicU64,
}

impl CorrelationBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `outbound` as the active peer, replacing any previous one.
    pub fn connect(&self, outbound: mpsc::UnboundedSender<String>) -> PeerId {
        let id = self.next_peer_id.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = self.peer.write().replace(Peer { id, outbound });
        match previous {
            Some(old) => info!(peer_id = id, replaced = old.id, "escrow peer replaced"),
            None => info!(peer_id = id, "escrow peer connected"),
        }
        id
    }

    /// Clears the active peer. Pending waiters are left to their own timeouts.
    pub fn disconnect(&self) {
        if let Some(old) = self.peer.write().take() {
            info!(peer_id = old.id, pending = self.pending_count(), "escrow peer disconnected");
        }
    }

    /// Clears the slot only if `peer_id` still holds it.
    pub fn release(&self, peer_id: PeerId) -> bool {
        let mut slot = self.peer.write();
        if slot.as_ref().is_some_and(|p| p.id == peer_id) {
            *slot = None;
            drop(slot);
            info!(peer_id, pending = self.pending_count(), "escrow peer disconnected");
            true
        } else {
            debug!(peer_id, "stale escrow peer closed");
            false
        }
    }

    pub fn peer_connected(&self) -> bool {
        self.peer.read().is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Forwards a frame to the active peer. Without a peer the frame is
    /// dropped; callers notice only through their wait timing out.
    pub fn send(&self, message: &ServerMessage) {
        let frame = match serde_json::to_string(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(request_id = %message.request_id, error = %e, "failed to encode peer frame");
                return;
            }
        };
        let slot = self.peer.read();
        let Some(peer) = slot.as_ref() else {
            warn!(request_id = %message.request_id, "no escrow peer connected, frame dropped");
            return;
        };
        if peer.outbound.send(frame).is_err() {
            warn!(peer_id = peer.id, request_id = %message.request_id, "escrow peer channel closed, frame dropped");
        }
    }

    /// Registers a fresh correlation id, sends `{type, requestId, payload}`
    /// and waits for [`Self::resolve`] or the deadline. The slot is gone when
    /// this returns, whichever way it ends.
    pub async fn issue_and_wait(
        &self,
        kind: RequestKind,
        payload: Value,
        timeout: Duration,
    ) -> Exchange {
        let request_id = uuid::Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(request_id.clone(), tx);
        let _slot = PendingSlot {
            broker: self,
            request_id: &request_id,
        };

        debug!(%request_id, ?kind, "escrow request issued");
        self.send(&ServerMessage {
            kind,
            request_id: request_id.clone(),
            payload,
        });

        let reply = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => {
                debug!(%request_id, success = reply.success, "escrow request resolved");
                Some(reply)
            }
            Ok(Err(_)) => None,
            Err(_) => {
                warn!(%request_id, ?kind, timeout_ms = timeout.as_millis(), "escrow request timed out");
                None
            }
        };

        Exchange {
            request_id: request_id.clone(),
            reply,
        }
    }

    /// Completes the waiter for `request_id`. Unknown, late or duplicate ids
    /// are ignored.
    pub fn resolve(&self, request_id: &str, payload: OperationResultPayload) {
        let waiter = self.pending.lock().remove(request_id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(payload);
            }
            None => debug!(request_id, "reply for unknown request ignored"),
        }
    }
}

struct PendingSlot<'a> {
    broker: &'a CorrelationBroker,
    request_id: &'a str,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.broker.pending.lock().remove(self.request_id);
    }
}

#[async_trait]
impl EscrowChannel for CorrelationBroker {
    async fn issue_and_wait(
        &self,
        kind: RequestKind,
        payload: Value,
        timeout: Duration,
    ) -> Exchange {
        Self::issue_and_wait(self, kind, payload, timeout).await
    }

    fn peer_connected(&self) -> bool {
        Self::peer_connected(self)
    }
}
