use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl OpenAiCompatibleConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://aihubmix.com".to_string(),
            model: model.into(),
            timeout: Duration::from_secs(30),
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClassifierProviderConfig {
    OpenAiCompatible(OpenAiCompatibleConfig),
    /// Offline marker matching, used when no model endpoint is configured.
    Keyword,
}
