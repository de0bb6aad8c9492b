use adctx_core::PrivacyLabel;

#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub text: String,
    pub additional_context: Option<String>,
}

impl ClassificationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            additional_context: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassificationResponse {
    pub provider: String,
    pub model: String,
    pub label: PrivacyLabel,
}
