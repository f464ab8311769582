use crate::{ImageSource, ProviderError, SearchResponse, SearchService};
use bytes::Bytes;

/// Stand-in used when no search server is configured: every query yields an
/// empty result set and images are never available.
#[derive(Debug, Default)]
pub struct NoopService;

#[async_trait::async_trait]
impl SearchService for NoopService {
    async fn search(&self, text_query: &str) -> Result<SearchResponse, ProviderError> {
        Ok(SearchResponse {
            text_query: text_query.to_string(),
            image_list_with_metadata: vec![],
        })
    }
}

#[async_trait::async_trait]
impl ImageSource for NoopService {
    async fn fetch(&self, _key: &str) -> Result<Bytes, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
