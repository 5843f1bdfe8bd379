use async_trait::async_trait;
use reqwest::{Client, Request, Url};
use tracing::debug;

use crate::config::AwairConfig;
use crate::error::FetchError;
use crate::model::{rfc3339, AirDataResponse, Reading, TimeWindow};

const MAX_ERROR_BODY: usize = 512;

/// Source of sensor readings for a time window.
#[async_trait]
pub trait AirDataSource: Send + Sync {
    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Reading>, FetchError>;
}

/// Client for the Awair per-device raw air-data endpoint.
#[derive(Debug, Clone)]
pub struct AwairClient {
    http: Client,
    config: AwairConfig,
}

impl AwairClient {
    pub fn new(config: AwairConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(FetchError::Transport)?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: AwairConfig) -> Self {
        Self { http, config }
    }

    /// `{api_base}/v1/users/self/devices/{device_type}/{device_id}/air-data/raw`
    pub fn endpoint(&self) -> Result<Url, FetchError> {
        let base = &self.config.api_base;
        let invalid = |reason: String| FetchError::InvalidUrl {
            url: base.clone(),
            reason,
        };

        let mut url = Url::parse(base).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot be a base".into()))?
            .pop_if_empty()
            .extend([
                "v1",
                "users",
                "self",
                "devices",
                self.config.device_type.as_str(),
                self.config.device_id.as_str(),
                "air-data",
                "raw",
            ]);
        Ok(url)
    }

    pub fn build_request(&self, window: &TimeWindow) -> Result<Request, FetchError> {
        let from = rfc3339(window.from());
        let to = rfc3339(window.to());

        self.http
            .get(self.endpoint()?)
            .query(&[
                ("fahrenheit", "false"),
                ("from", from.as_str()),
                ("to", to.as_str()),
            ])
            .bearer_auth(&self.config.api_key)
            .build()
            .map_err(FetchError::Transport)
    }
}

#[async_trait]
impl AirDataSource for AwairClient {
    async fn fetch(&self, window: &TimeWindow) -> Result<Vec<Reading>, FetchError> {
        let request = self.build_request(window)?;
        debug!(url = %request.url(), "requesting Awair air data");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status,
                body: excerpt(&body),
            });
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        parse_readings(&body)
    }
}

/// Decodes an air-data response body and flattens it into readings, preserving the
/// order the API reported them in.
pub fn parse_readings(body: &[u8]) -> Result<Vec<Reading>, FetchError> {
    let response: AirDataResponse = serde_json::from_slice(body).map_err(FetchError::Decode)?;
    Ok(response.into_readings())
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
