use adctx_core::{MemoryMetadata, MemoryRecord};
use async_trait::async_trait;
use thiserror::Error;

pub mod local;
pub mod mem0;

pub use local::LocalMemoryStore;
pub use mem0::{Mem0Config, Mem0Store};

/// One similarity hit as returned by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredHit {
    pub id: String,
    pub content: String,
    pub metadata: MemoryMetadata,
    pub score: f32,
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Persists the record and returns the store-assigned id, if the store
    /// reports one.
    async fn add(&self, record: &MemoryRecord) -> Result<Option<String>, StorageError>;

    /// Up to `top_k` hits, best first.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<StoredHit>, StorageError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The store could not be reached at all. Callers may switch to a fallback.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store API error: status={status}, body={body}")]
    Api { status: u16, body: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StorageError {
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
