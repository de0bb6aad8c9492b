use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use adctx_core::{MemoryMetadata, MemoryRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{MemoryStore, StorageError, StoredHit};

/// Floor score for a query that appears verbatim inside a memory.
const SUBSTRING_SCORE: f32 = 0.8;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalEntry {
    pub id: String,
    pub content: String,
    pub metadata: MemoryMetadata,
    pub timestamp_ms: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    memories: Vec<LocalEntry>,
}

/// JSON-file store used when the semantic store is unreachable. Scores are
/// lexical overlap, so they are comparable to, not equal to, semantic scores.
///
/// Opening is synchronous and happens once at startup. Writes after that go
/// through `tokio::fs` while the entry lock is held, so the file always
/// matches the in-memory list.
pub struct LocalMemoryStore {
    path: PathBuf,
    entries: Mutex<Vec<LocalEntry>>,
}

impl LocalMemoryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            let bytes = serde_json::to_vec_pretty(&Persisted::default())?;
            fs::write(&path, bytes)?;
        }

        let bytes = fs::read(&path)?;
        let persisted: Persisted = serde_json::from_slice(&bytes)?;
        Ok(Self {
            path,
            entries: Mutex::new(persisted.memories),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn persist(&self, entries: &[LocalEntry]) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&PersistedRef { memories: entries })?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct PersistedRef<'a> {
    memories: &'a [LocalEntry],
}

#[async_trait]
impl MemoryStore for LocalMemoryStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn add(&self, record: &MemoryRecord) -> Result<Option<String>, StorageError> {
        if record.content().trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "content cannot be empty".to_string(),
            ));
        }

        let entry = LocalEntry {
            id: uuid::Uuid::new_v4().to_string(),
            content: record.content().to_string(),
            metadata: record.metadata().clone(),
            timestamp_ms: now_ms(),
        };
        let id = entry.id.clone();

        let mut entries = self.entries.lock().await;
        entries.push(entry);
        if let Err(e) = self.persist(&entries).await {
            entries.pop();
            return Err(e);
        }
        Ok(Some(id))
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<StoredHit>, StorageError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let entries = self.entries.lock().await;
        let mut hits = entries
            .iter()
            .map(|e| StoredHit {
                id: e.id.clone(),
                content: e.content.clone(),
                metadata: e.metadata.clone(),
                score: lexical_similarity(query, &e.content),
            })
            .collect::<Vec<_>>();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

/// Fraction of distinct query words present in `text`, raised to
/// [`SUBSTRING_SCORE`] when the whole query occurs inside it.
pub fn lexical_similarity(query: &str, text: &str) -> f32 {
    let query = query.to_lowercase();
    let text = text.to_lowercase();
    let query_words = query.split_whitespace().collect::<HashSet<_>>();
    if query_words.is_empty() {
        return 0.0;
    }
    let text_words = text.split_whitespace().collect::<HashSet<_>>();
    let shared = query_words.intersection(&text_words).count();
    #[allow(clippy::cast_precision_loss)]
    let mut score = shared as f32 / query_words.len() as f32;
    if text.contains(query.trim()) {
        score = score.max(SUBSTRING_SCORE);
    }
    score
}

#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
