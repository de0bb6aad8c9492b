use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("filter returned invalid response: {0}")]
    InvalidResponse(String),

    #[error("filter API error: status={status}, body={body}")]
    Api { status: u16, body: String },
}
