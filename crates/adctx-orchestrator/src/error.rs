use adctx_core::RecordError;
use adctx_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("input text cannot be empty")]
    EmptyInput,
    #[error("privacy classification failed: {0}")]
    Classification(#[from] adctx_classify::ProviderError),
    #[error("memory store failed: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid memory record: {0}")]
    Record(#[from] RecordError),
}
