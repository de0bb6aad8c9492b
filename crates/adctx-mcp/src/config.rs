use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adctx_broker::EscrowChannel;
use adctx_classify::{build_classifier, ClassifierProviderConfig, OpenAiCompatibleConfig};
use adctx_filter::{build_relevance_filter, FilterProviderConfig, OpenAiFilterConfig};
use adctx_orchestrator::{MemoryOrchestrator, OrchestratorConfig, StoreRouter, DEFAULT_RELEVANCE_THRESHOLD};
use adctx_storage::{LocalMemoryStore, Mem0Config, Mem0Store, MemoryStore, StorageError};
use thiserror::Error;
use tracing::info;

const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:1234";
const DEFAULT_MEMORY_DB: &str = "./data/local-memories.json";
const DEFAULT_CLASSIFIER_MODEL: &str = "gemini-2.5-flash-lite";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("privacy classifier: {0}")]
    Classifier(#[from] adctx_classify::ProviderError),
    #[error("relevance filter: {0}")]
    Filter(#[from] adctx_filter::ProviderError),
    #[error("memory store: {0}")]
    Storage(#[from] StorageError),
}

/// Daemon settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_addr: String,
    pub sse_heartbeat: Duration,
    pub escrow_timeout: Duration,
    pub relevance_threshold: f32,
    pub memory_source: String,
    pub local_db_path: PathBuf,
    /// `None` runs on the local store from the start.
    pub mem0: Option<Mem0Config>,
    pub classifier: ClassifierProviderConfig,
    /// `None` returns raw results without an integrated summary.
    pub filter: Option<FilterProviderConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = Env(lookup);

        let mem0 = env.string("MEM0_API_KEY").map(|key| {
            let mut cfg = Mem0Config::new(key);
            if let Some(url) = env.string("MEM0_BASE_URL") {
                cfg.base_url = url;
            }
            if let Some(user) = env.string("MEM0_USER_ID") {
                cfg.user_id = user;
            }
            cfg
        });

        let classifier = match env.string("ADCTX_CLASSIFIER_API_KEY") {
            Some(key) => {
                let model = env
                    .string("ADCTX_CLASSIFIER_MODEL")
                    .unwrap_or_else(|| DEFAULT_CLASSIFIER_MODEL.to_string());
                let mut cfg = OpenAiCompatibleConfig::new(key, model);
                if let Some(url) = env.string("ADCTX_CLASSIFIER_BASE_URL") {
                    cfg.base_url = url;
                }
                ClassifierProviderConfig::OpenAiCompatible(cfg)
            }
            None => ClassifierProviderConfig::Keyword,
        };

        let filter = env.string("ADCTX_FILTER_API_KEY").map(|key| {
            let mut cfg = OpenAiFilterConfig::new(key);
            if let Some(url) = env.string("ADCTX_FILTER_BASE_URL") {
                cfg.base_url = url;
            }
            if let Some(model) = env.string("ADCTX_FILTER_MODEL") {
                cfg.model = model;
            }
            FilterProviderConfig::OpenAiCompatible(cfg)
        });

        #[allow(clippy::cast_possible_truncation)]
        let relevance_threshold = env.f64(
            "ADCTX_RELEVANCE_THRESHOLD",
            f64::from(DEFAULT_RELEVANCE_THRESHOLD),
            0.0,
            1.0,
        ) as f32;

        Self {
            http_addr: env
                .string("ADCTX_HTTP_ADDR")
                .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
            sse_heartbeat: Duration::from_millis(env.u64("ADCTX_SSE_HEARTBEAT_MS", 30_000, 100, 300_000)),
            escrow_timeout: Duration::from_millis(env.u64("ADCTX_ESCROW_TIMEOUT_MS", 60_000, 100, 600_000)),
            relevance_threshold,
            memory_source: env
                .string("ADCTX_MEMORY_SOURCE")
                .unwrap_or_else(|| "user_input".to_string()),
            local_db_path: env
                .string("ADCTX_MEMORY_DB")
                .unwrap_or_else(|| DEFAULT_MEMORY_DB.to_string())
                .into(),
            mem0,
            classifier,
            filter,
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            relevance_threshold: self.relevance_threshold,
            escrow_timeout: self.escrow_timeout,
            source: self.memory_source.clone(),
        }
    }
}

/// Wires the collaborators described by `cfg` around `escrow`.
pub fn build_orchestrator(
    cfg: &ServerConfig,
    escrow: Arc<dyn EscrowChannel>,
) -> Result<MemoryOrchestrator, StartupError> {
    let classifier = build_classifier(cfg.classifier.clone())?;
    let fallback: Arc<dyn MemoryStore> = Arc::new(LocalMemoryStore::open(&cfg.local_db_path)?);
    let store = match &cfg.mem0 {
        Some(mem0) => StoreRouter::new(Arc::new(Mem0Store::new(mem0.clone())?), fallback),
        None => {
            info!(path = %cfg.local_db_path.display(), "no primary store configured, using local store");
            StoreRouter::fallback_only(fallback)
        }
    };

    let orchestrator =
        MemoryOrchestrator::new(classifier, store, escrow, cfg.orchestrator_config());
    Ok(match &cfg.filter {
        Some(filter) => orchestrator.with_filter(build_relevance_filter(filter.clone())?),
        None => orchestrator,
    })
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn u64(&self, name: &str, default: u64, min: u64, max: u64) -> u64 {
        self.string(name)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(default)
            .clamp(min, max)
    }

    fn f64(&self, name: &str, default: f64, min: f64, max: f64) -> f64 {
        self.string(name)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(default)
            .clamp(min, max)
    }
}
