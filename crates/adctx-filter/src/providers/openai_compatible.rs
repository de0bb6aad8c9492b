use adctx_core::ChatCompletionResponse;
use reqwest::Client;

use crate::config::OpenAiFilterConfig;
use crate::error::ProviderError;
use crate::prompt::{integration_message, normalize_summary};
use crate::traits::RelevanceFilter;
use crate::types::{FilterRequest, FilterResponse};

#[derive(Clone)]
pub struct OpenAiCompatibleFilter {
    config: OpenAiFilterConfig,
    client: Client,
}

impl OpenAiCompatibleFilter {
    pub fn new(config: OpenAiFilterConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config("filter api key is empty".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl RelevanceFilter for OpenAiCompatibleFilter {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn integrate(&self, request: FilterRequest) -> Result<FilterResponse, ProviderError> {
        if request.contexts.is_empty() {
            return Ok(FilterResponse {
                provider: self.name().to_string(),
                model: self.config.model.clone(),
                summary: String::new(),
            });
        }

        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": integration_message(&request.query, &request.contexts),
            }],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let parsed: ChatCompletionResponse = res.json().await?;
        let (model, content) = parsed.into_parts();
        let content =
            content.ok_or_else(|| ProviderError::InvalidResponse("no message content".to_string()))?;

        Ok(FilterResponse {
            provider: self.name().to_string(),
            model: model.unwrap_or_else(|| self.config.model.clone()),
            summary: normalize_summary(&content),
        })
    }
}

