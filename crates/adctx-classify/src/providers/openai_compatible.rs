use adctx_core::{ChatCompletionResponse, PrivacyLabel, PrivacyTier};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::OpenAiCompatibleConfig;
use crate::error::ProviderError;
use crate::prompt::{classification_message, strip_code_fence};
use crate::traits::PrivacyClassifier;
use crate::types::{ClassificationRequest, ClassificationResponse};

#[derive(Clone)]
pub struct OpenAiCompatibleClassifier {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleClassifier {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config(
                "classifier api key is empty".to_string(),
            ));
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
impl PrivacyClassifier for OpenAiCompatibleClassifier {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<ClassificationResponse, ProviderError> {
        if request.text.trim().is_empty() {
            return Err(ProviderError::Config(
                "classification input is empty".to_string(),
            ));
        }

        let payload = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": classification_message(&request.text, request.additional_context.as_deref()),
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

        Ok(ClassificationResponse {
            provider: self.name().to_string(),
            model: model.unwrap_or_else(|| self.config.model.clone()),
            label: parse_label(&content)?,
        })
    }
}

/// Turns the model's JSON answer into a label. Anything that does not carry a
/// tier in 1..=5 is rejected instead of being read as public.
pub fn parse_label(content: &str) -> Result<PrivacyLabel, ProviderError> {
    let raw: RawLabel = serde_json::from_str(strip_code_fence(content)).map_err(|e| {
        ProviderError::InvalidResponse(format!("classification is not valid JSON: {e}"))
    })?;

    let level = match &raw.privacy_level {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .and_then(|n| u8::try_from(n).ok())
    .ok_or_else(|| {
        ProviderError::InvalidResponse(format!(
            "privacy_level is not an integer: {}",
            raw.privacy_level
        ))
    })?;
    let tier = PrivacyTier::try_from(level)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let brief = match raw.brief.map(|b| b.trim().to_string()) {
        Some(b) if !b.is_empty() => b,
        _ => default_brief(tier),
    };

    Ok(PrivacyLabel {
        tier,
        confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
        brief,
        risk_indicators: raw.risk_indicators,
        compliance_notes: raw.compliance_notes.filter(|n| !n.trim().is_empty()),
    })
}

fn default_brief(tier: PrivacyTier) -> String {
    format!("The user shared {} information; this is private data.", tier.label())
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    privacy_level: Value,
    confidence: Option<f32>,
    brief: Option<String>,
    #[serde(default)]
    risk_indicators: Vec<String>,
    compliance_notes: Option<String>,
}
