use std::sync::Arc;

use adctx_broker::{decrypt_payload, escrow_payload, EscrowChannel, RequestKind};
use adctx_classify::{ClassificationRequest, PrivacyClassifier};
use adctx_core::{retain_relevant, CandidateResult, MemoryRecord, PrivacyTier};
use adctx_filter::{FilterRequest, RelevanceFilter};
use adctx_storage::StoredHit;
use futures_util::future::join_all;
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::router::{StoreMode, StoreRouter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Raw text persisted as-is.
    Stored,
    /// Raw text handed to the peer; only the brief was persisted.
    Escrowed { external_ref: String },
    /// The peer did not confirm. Nothing was persisted.
    EscrowFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddReport {
    pub tier: PrivacyTier,
    pub outcome: AddOutcome,
    pub memory_id: Option<String>,
}

impl AddReport {
    pub const fn is_success(&self) -> bool {
        !matches!(self.outcome, AddOutcome::EscrowFailed { .. })
    }

    /// Caller-facing status line reporting outcome and tier.
    pub fn status(&self) -> String {
        let level = format!(
            "Privacy level: {} ({})",
            self.tier.level(),
            self.tier.label()
        );
        match &self.outcome {
            AddOutcome::Stored => format!("Memory stored successfully.\n{level}"),
            AddOutcome::Escrowed { .. } => format!(
                "Sensitive memory escrowed; only a non-disclosing brief was stored.\n{level}"
            ),
            AddOutcome::EscrowFailed { reason } => {
                format!("Failed to store memory: {reason}. Nothing was persisted.\n{level}")
            }
        }
    }
}

/// Outcome of one search: the integrated summary and the candidates that
/// cleared the relevance threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub query: String,
    pub summary: String,
    pub results: Vec<CandidateResult>,
}

impl SearchReport {
    pub fn total_found(&self) -> usize {
        self.results.len()
    }

    pub fn has_filtered_content(&self) -> bool {
        !self.summary.is_empty()
    }
}

#[derive(Serialize)]
struct SearchBody<'a> {
    filtered_summary: &'a str,
    raw_results: Vec<RawResult<'a>>,
    query: &'a str,
    total_found: usize,
    has_filtered_content: bool,
}

#[derive(Serialize)]
struct RawResult<'a> {
    content: &'a str,
    score: f32,
    metadata: RawMetadata<'a>,
}

#[derive(Serialize)]
struct RawMetadata<'a> {
    privacy_level: PrivacyTier,
    source: &'a str,
}

impl Serialize for SearchReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SearchBody {
            filtered_summary: &self.summary,
            raw_results: self
                .results
                .iter()
                .map(|c| RawResult {
                    content: &c.content,
                    score: c.score,
                    metadata: RawMetadata {
                        privacy_level: c.tier,
                        source: &c.source,
                    },
                })
                .collect(),
            query: &self.query,
            total_found: self.total_found(),
            has_filtered_content: self.has_filtered_content(),
        }
        .serialize(serializer)
    }
}

pub struct MemoryOrchestrator {
    classifier: Arc<dyn PrivacyClassifier>,
    filter: Option<Arc<dyn RelevanceFilter>>,
    store: StoreRouter,
    escrow: Arc<dyn EscrowChannel>,
    config: OrchestratorConfig,
}

impl MemoryOrchestrator {
    pub fn new(
        classifier: Arc<dyn PrivacyClassifier>,
        store: StoreRouter,
        escrow: Arc<dyn EscrowChannel>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            classifier,
            filter: None,
            store,
            escrow,
            config,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn RelevanceFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn store_mode(&self) -> StoreMode {
        self.store.mode()
    }

    pub fn peer_connected(&self) -> bool {
        self.escrow.peer_connected()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Classifies `text` and persists it. Tiers 1-2 are stored verbatim; for
    /// tiers 3-5 the raw text goes to the escrow peer first and only the
    /// brief is stored, or nothing at all if the peer does not confirm.
    pub async fn add(&self, text: &str) -> Result<AddReport, OrchestratorError> {
        if text.trim().is_empty() {
            return Err(OrchestratorError::EmptyInput);
        }

        let classified = self
            .classifier
            .classify(ClassificationRequest::new(text))
            .await?;
        let label = classified.label;
        let tier = label.tier;
        debug!(
            classifier = %classified.provider,
            tier = tier.level(),
            confidence = label.confidence,
            "memory classified"
        );

        if !tier.requires_escrow() {
            let record = MemoryRecord::verbatim(text, tier, self.config.source.as_str())?;
            let memory_id = self.store.add(&record).await?;
            info!(tier = tier.level(), memory_id = ?memory_id, "memory stored verbatim");
            return Ok(AddReport {
                tier,
                outcome: AddOutcome::Stored,
                memory_id,
            });
        }

        let exchange = self
            .escrow
            .issue_and_wait(
                RequestKind::Escrow,
                escrow_payload(text),
                self.config.escrow_timeout,
            )
            .await;

        if !exchange.succeeded() {
            let reason = match &exchange.reply {
                None => "escrow peer did not answer in time".to_string(),
                Some(reply) => reply
                    .error
                    .clone()
                    .unwrap_or_else(|| "escrow peer rejected the request".to_string()),
            };
            warn!(
                tier = tier.level(),
                request_id = %exchange.request_id,
                %reason,
                "escrow failed, memory not stored"
            );
            return Ok(AddReport {
                tier,
                outcome: AddOutcome::EscrowFailed { reason },
                memory_id: None,
            });
        }

        let record = MemoryRecord::escrowed(
            label.brief,
            tier,
            self.config.source.as_str(),
            exchange.request_id.as_str(),
        )?;
        let memory_id = self.store.add(&record).await?;
        info!(
            tier = tier.level(),
            external_ref = %exchange.request_id,
            memory_id = ?memory_id,
            "sensitive memory escrowed"
        );
        Ok(AddReport {
            tier,
            outcome: AddOutcome::Escrowed {
                external_ref: exchange.request_id,
            },
            memory_id,
        })
    }

    /// Looks up `query`, resolves escrowed hits through the peer, drops
    /// everything under the threshold and asks the filter for a summary.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<SearchReport, OrchestratorError> {
        let hits = self.store.search(query, top_k).await?;
        let found = hits.len();

        let candidates = join_all(hits.into_iter().map(|hit| self.resolve_candidate(hit))).await;
        let results = retain_relevant(candidates, self.config.relevance_threshold);
        debug!(
            found,
            kept = results.len(),
            threshold = self.config.relevance_threshold,
            "search candidates filtered"
        );

        let summary = self.integrate(query, &results).await;
        Ok(SearchReport {
            query: query.to_string(),
            summary,
            results,
        })
    }

    async fn resolve_candidate(&self, hit: StoredHit) -> CandidateResult {
        let mut candidate = CandidateResult {
            content: hit.content,
            score: hit.score,
            tier: hit.metadata.privacy_level,
            source: hit.metadata.source,
            external_ref: hit.metadata.external_ref,
        };
        let Some(reference) = candidate.external_ref.clone() else {
            return candidate;
        };

        let exchange = self
            .escrow
            .issue_and_wait(
                RequestKind::Decrypt,
                decrypt_payload(&reference),
                self.config.escrow_timeout,
            )
            .await;
        match exchange.reply.as_ref().and_then(|r| r.plaintext()) {
            Some(plaintext) => candidate.content = plaintext.to_string(),
            None => debug!(%reference, "escrowed memory left as brief"),
        }
        candidate
    }

    async fn integrate(&self, query: &str, results: &[CandidateResult]) -> String {
        let Some(filter) = &self.filter else {
            return String::new();
        };
        if results.is_empty() {
            return String::new();
        }

        let request = FilterRequest {
            query: query.to_string(),
            contexts: results.iter().map(|c| c.content.clone()).collect(),
        };
        match filter.integrate(request).await {
            Ok(res) => res.summary,
            Err(e) => {
                warn!(filter = filter.name(), error = %e, "relevance filter failed, returning raw results");
                String::new()
            }
        }
    }
}
