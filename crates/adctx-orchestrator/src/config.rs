use std::time::Duration;

use adctx_core::DEFAULT_RELEVANCE_THRESHOLD;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Inclusive lower bound on candidate scores kept by a search.
    pub relevance_threshold: f32,
    /// How long a single escrow or decryption round-trip may take.
    pub escrow_timeout: Duration,
    /// `source` metadata attached to every write.
    pub source: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            escrow_timeout: Duration::from_secs(60),
            source: "user_input".to_string(),
        }
    }
}
