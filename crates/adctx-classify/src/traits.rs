use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{ClassificationRequest, ClassificationResponse};

#[async_trait]
pub trait PrivacyClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<ClassificationResponse, ProviderError>;
}
