use crate::config::AppConfig;
use crate::controller::ResultSetController;
use anyhow::Context;
use providers::http::{HttpService, HttpServiceConfig};
use providers::noop::NoopService;
use providers::{ImageSource, SearchService};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct Services {
    pub search: Arc<dyn SearchService>,
    pub images: Arc<dyn ImageSource>,
}

pub fn build_services(config: &AppConfig) -> anyhow::Result<Services> {
    let service = &config.service;
    match service.provider.as_str() {
        "http" => {
            let http = HttpService::new(HttpServiceConfig {
                base_url: service.base_url.clone(),
                search_path: service.search_path.clone(),
                query_param: service.query_param.clone(),
                images_path: service.images_path.clone(),
                timeout: service.timeout_secs.map(Duration::from_secs),
            })
            .context("building http client")?;
            info!(base_url = %service.base_url, "using http search service");
            Ok(Services {
                search: Arc::new(http.clone()),
                images: Arc::new(http),
            })
        }
        "noop" => {
            info!("using noop search service");
            Ok(Services {
                search: Arc::new(NoopService),
                images: Arc::new(NoopService),
            })
        }
        other => anyhow::bail!("unknown service provider: {}", other),
    }
}

pub fn build_controller(config: &AppConfig) -> anyhow::Result<ResultSetController> {
    let services = build_services(config)?;
    Ok(ResultSetController::new(services.search, services.images))
}
