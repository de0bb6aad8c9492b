use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The model answered, but not with a usable classification.
    #[error("classifier returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("classifier API error: status={status}, body={body}")]
    Api { status: u16, body: String },
}
