use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiFilterConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl OpenAiFilterConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(20),
            temperature: 0.2,
            max_tokens: 1500,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FilterProviderConfig {
    OpenAiCompatible(OpenAiFilterConfig),
}
