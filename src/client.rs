//! Investment listing transport

use crate::error::{ConfigError, FetchError};
use crate::settings::Settings;
use crate::types::{CategorySelector, InvestmentsResponse};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;

/// Where the loader gets its listings from
#[async_trait]
pub trait InvestmentSource: Send + Sync {
    /// Fetch the raw envelope for one category. Envelope validation is left to the caller.
    async fn fetch(&self, category: &CategorySelector) -> Result<InvestmentsResponse, FetchError>;
}

/// HTTP implementation against the by-category endpoint
pub struct HttpSource {
    client: reqwest::Client,
    endpoint: String,
    csrf_token: Option<String>,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(
        endpoint: impl Into<String>,
        csrf_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            csrf_token,
            timeout,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Self::new(
            settings.endpoint_url()?,
            settings.csrf_token.clone(),
            Duration::from_millis(settings.timeout_ms),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_decode() {
            FetchError::InvalidResponse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl InvestmentSource for HttpSource {
    async fn fetch(&self, category: &CategorySelector) -> Result<InvestmentsResponse, FetchError> {
        debug!(url = %self.endpoint, category = %category, "Requesting investments");

        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("category_id", category.query_value())])
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.csrf_token {
            request = request.header("X-CSRF-TOKEN", token.as_str());
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        debug!(status = %status, "Investments response received");
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {}", status)));
        }

        response
            .json::<InvestmentsResponse>()
            .await
            .map_err(|e| self.classify(e))
    }
}
