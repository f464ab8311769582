use crate::{ImageSource, ProviderError, SearchResponse, SearchService};
use bytes::Bytes;
use reqwest::{Client, Response, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    pub base_url: String,
    pub search_path: String,
    pub query_param: String,
    pub images_path: String,
    pub timeout: Option<Duration>,
}

impl Default for HttpServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            search_path: "search".to_string(),
            query_param: "text_query".to_string(),
            images_path: "images".to_string(),
            timeout: None,
        }
    }
}

/// Talks to the search server over HTTP. One instance serves both the search
/// endpoint and the image endpoint.
#[derive(Clone)]
pub struct HttpService {
    client: Client,
    cfg: Arc<HttpServiceConfig>,
}

impl HttpService {
    pub fn new(cfg: HttpServiceConfig) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(Self {
            client,
            cfg: Arc::new(cfg),
        })
    }

    pub fn search_url(&self) -> Result<Url, ProviderError> {
        self.endpoint(&self.cfg.search_path, None)
    }

    pub fn image_url(&self, key: &str) -> Result<Url, ProviderError> {
        self.endpoint(&self.cfg.images_path, Some(key))
    }

    /// Joins configured path segments onto the base url. The resource key is
    /// pushed as a single, percent-encoded segment.
    fn endpoint(&self, path: &str, key: Option<&str>) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.cfg.base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", self.cfg.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ProviderError::InvalidUrl(self.cfg.base_url.clone()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(key) = key {
                segments.push(key);
            }
        }
        Ok(url)
    }
}

async fn ensure_success(resp: Response) -> Result<Response, ProviderError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait::async_trait]
impl SearchService for HttpService {
    async fn search(&self, text_query: &str) -> Result<SearchResponse, ProviderError> {
        let url = self.search_url()?;
        debug!(%url, query = text_query, "search request");
        let resp = self
            .client
            .get(url)
            .query(&[(self.cfg.query_param.as_str(), text_query)])
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let resp = ensure_success(resp).await?;
        resp.json::<SearchResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ImageSource for HttpService {
    async fn fetch(&self, key: &str) -> Result<Bytes, ProviderError> {
        let url = self.image_url(key)?;
        debug!(%url, "image request");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let resp = ensure_success(resp).await?;
        resp.bytes()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }
}
