use std::sync::Arc;

use crate::config::FilterProviderConfig;
use crate::error::ProviderError;
use crate::providers::OpenAiCompatibleFilter;
use crate::traits::RelevanceFilter;

pub fn build_relevance_filter(
    cfg: FilterProviderConfig,
) -> Result<Arc<dyn RelevanceFilter>, ProviderError> {
    match cfg {
        FilterProviderConfig::OpenAiCompatible(c) => Ok(Arc::new(OpenAiCompatibleFilter::new(c)?)),
    }
}
