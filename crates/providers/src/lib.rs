//! Clients for the remote search service and its image-serving endpoint.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod http;
pub mod noop;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("status {status} body {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Body of a successful `/search` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub text_query: String,
    pub image_list_with_metadata: Vec<MatchPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPayload {
    pub image_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub application_name: String,
    pub timestamp: String,
    pub distance: f64,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[async_trait::async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, text_query: &str) -> Result<SearchResponse, ProviderError>;
}

/// Resolves a resource key (the final segment of an image path) to raw bytes.
#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<Bytes, ProviderError>;
}
