pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::Result;
use crate::services::{
    result_service::ResultService, test_service::TestService, upstream_service::UpstreamService,
};

#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: Arc<str>,
    pub upstream: UpstreamService,
    pub test_service: TestService,
    pub result_service: ResultService,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let upstream = UpstreamService::new(
            config.upstream_api_url.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )?;

        let test_service = TestService::new(upstream.clone(), config.max_batch_size);
        let result_service = ResultService::new(upstream.clone());

        Ok(Self {
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            upstream,
            test_service,
            result_service,
        })
    }
}
