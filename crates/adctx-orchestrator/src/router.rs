use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use adctx_core::MemoryRecord;
use adctx_storage::{MemoryStore, StorageError, StoredHit};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    Primary,
    Fallback,
}

impl StoreMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// Sends every call to the primary store until it is found unreachable, then
/// to the fallback for the rest of the router's life.
pub struct StoreRouter {
    primary: Option<Arc<dyn MemoryStore>>,
    fallback: Arc<dyn MemoryStore>,
    degraded: AtomicBool,
}

impl StoreRouter {
    pub fn new(primary: Arc<dyn MemoryStore>, fallback: Arc<dyn MemoryStore>) -> Self {
        Self {
            primary: Some(primary),
            fallback,
            degraded: AtomicBool::new(false),
        }
    }

    /// Router with no primary configured, already on the fallback.
    pub fn fallback_only(fallback: Arc<dyn MemoryStore>) -> Self {
        Self {
            primary: None,
            fallback,
            degraded: AtomicBool::new(true),
        }
    }

    pub fn mode(&self) -> StoreMode {
        if self.healthy_primary().is_some() {
            StoreMode::Primary
        } else {
            StoreMode::Fallback
        }
    }

    fn healthy_primary(&self) -> Option<&Arc<dyn MemoryStore>> {
        if self.degraded.load(Ordering::Acquire) {
            None
        } else {
            self.primary.as_ref()
        }
    }

    fn engage_fallback(&self, primary: &dyn MemoryStore, err: &StorageError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(
                primary = primary.name(),
                fallback = self.fallback.name(),
                error = %err,
                "primary store unreachable, switching to fallback for good"
            );
        }
    }

    pub async fn add(&self, record: &MemoryRecord) -> Result<Option<String>, StorageError> {
        if let Some(primary) = self.healthy_primary() {
            match primary.add(record).await {
                Err(e) if e.is_unavailable() => self.engage_fallback(primary.as_ref(), &e),
                other => return other,
            }
        }
        self.fallback.add(record).await
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<StoredHit>, StorageError> {
        if let Some(primary) = self.healthy_primary() {
            match primary.search(query, top_k).await {
                Err(e) if e.is_unavailable() => self.engage_fallback(primary.as_ref(), &e),
                other => return other,
            }
        }
        self.fallback.search(query, top_k).await
    }
}
