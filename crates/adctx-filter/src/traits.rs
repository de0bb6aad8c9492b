use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{FilterRequest, FilterResponse};

#[async_trait]
pub trait RelevanceFilter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Condenses `contexts` into what bears on `query`. An empty summary means
    /// nothing was relevant.
    async fn integrate(&self, request: FilterRequest) -> Result<FilterResponse, ProviderError>;
}
