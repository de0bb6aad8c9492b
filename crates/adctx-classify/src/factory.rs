use std::sync::Arc;

use crate::config::ClassifierProviderConfig;
use crate::error::ProviderError;
use crate::providers::{KeywordClassifier, OpenAiCompatibleClassifier};
use crate::traits::PrivacyClassifier;

pub fn build_classifier(
    cfg: ClassifierProviderConfig,
) -> Result<Arc<dyn PrivacyClassifier>, ProviderError> {
    match cfg {
        ClassifierProviderConfig::OpenAiCompatible(c) => {
            Ok(Arc::new(OpenAiCompatibleClassifier::new(c)?))
        }
        ClassifierProviderConfig::Keyword => Ok(Arc::new(KeywordClassifier::new())),
    }
}
