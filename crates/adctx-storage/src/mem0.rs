use std::time::Duration;

use adctx_core::{MemoryMetadata, MemoryRecord};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;

use crate::{MemoryStore, StorageError, StoredHit};

#[derive(Debug, Clone)]
pub struct Mem0Config {
    pub api_key: String,
    pub base_url: String,
    pub user_id: String,
    pub timeout: Duration,
}

impl Mem0Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.mem0.ai".to_string(),
            user_id: "default_user".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Client for the hosted Mem0 memory API.
#[derive(Clone)]
pub struct Mem0Store {
    config: Mem0Config,
    client: Client,
}

impl Mem0Store {
    pub fn new(config: Mem0Config) -> Result<Self, StorageError> {
        if config.api_key.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "mem0 api key is empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<Response, StorageError> {
        let res = self
            .client
            .post(self.endpoint(path))
            .header("Authorization", format!("Token {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = res.status();
        if status.is_server_error() {
            let body = res.text().await.unwrap_or_default();
            return Err(StorageError::Unavailable(format!(
                "mem0 returned {}: {body}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res)
    }
}

fn classify_transport_error(e: reqwest::Error) -> StorageError {
    if e.is_timeout() || e.is_connect() {
        StorageError::Unavailable(e.to_string())
    } else {
        StorageError::Http(e)
    }
}

#[async_trait]
impl MemoryStore for Mem0Store {
    fn name(&self) -> &'static str {
        "mem0"
    }

    async fn add(&self, record: &MemoryRecord) -> Result<Option<String>, StorageError> {
        let body = json!({
            "messages": [{"role": "user", "content": record.content()}],
            "user_id": self.config.user_id,
            "metadata": record.metadata(),
            "infer": record.allows_inference(),
        });
        let res = self.post("/v1/memories/", body).await?;
        let events: AddEnvelope = res.json().await.map_err(classify_transport_error)?;
        Ok(events.into_items().into_iter().find_map(|e| e.id))
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<StoredHit>, StorageError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let body = json!({
            "query": query,
            "user_id": self.config.user_id,
            "top_k": top_k,
        });
        let res = self.post("/v1/memories/search/", body).await?;
        let found: SearchEnvelope = res.json().await.map_err(classify_transport_error)?;

        // Memories written by other clients carry no tier and are not ours to serve.
        let mut hits = found
            .into_items()
            .into_iter()
            .filter_map(|item| {
                let metadata = serde_json::from_value::<MemoryMetadata>(item.metadata?).ok()?;
                Some(StoredHit {
                    id: item.id,
                    content: item.memory,
                    metadata,
                    score: item.score.unwrap_or(0.0),
                })
            })
            .collect::<Vec<_>>();
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AddEnvelope {
    Wrapped { results: Vec<AddEvent> },
    Bare(Vec<AddEvent>),
}

impl AddEnvelope {
    fn into_items(self) -> Vec<AddEvent> {
        match self {
            Self::Wrapped { results } | Self::Bare(results) => results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddEvent {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchEnvelope {
    Wrapped { results: Vec<SearchItem> },
    Bare(Vec<SearchItem>),
}

impl SearchEnvelope {
    fn into_items(self) -> Vec<SearchItem> {
        match self {
            Self::Wrapped { results } | Self::Bare(results) => results,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: String,
    memory: String,
    score: Option<f32>,
    metadata: Option<serde_json::Value>,
}
