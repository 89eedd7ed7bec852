use std::time::Duration;

use cloudtrace_core::{JobRequest, StatusSnapshot};
use cloudtrace_logging::ct_debug;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use url::Url;

use crate::{Accepted, ApiError, FailureKind};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000/";
pub const START_PATH: &str = "benchmark";
pub const STATUS_PATH: &str = "benchmark/status";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    /// Whole-request timeout; `None` leaves hung calls to the transport.
    pub request_timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub max_bytes: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_SERVER_URL).expect("default server url is valid"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
            poll_interval: Duration::from_millis(1000),
            max_bytes: 1024 * 1024,
        }
    }
}

/// The two calls the dashboard makes against the benchmark server.
#[async_trait::async_trait]
pub trait BenchmarkApi: Send + Sync {
    async fn start_benchmark(&self, request: &JobRequest) -> Result<Accepted, ApiError>;

    async fn fetch_status(&self) -> Result<StatusSnapshot, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestBenchmarkApi {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestBenchmarkApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let mut base = self.settings.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    /// Reads the body, refusing anything over `max_bytes`.
    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl BenchmarkApi for ReqwestBenchmarkApi {
    async fn start_benchmark(&self, request: &JobRequest) -> Result<Accepted, ApiError> {
        let url = self.endpoint(START_PATH)?;
        let body = serde_json::to_vec(request)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        // An unreadable error body still leaves us with the status code.
        let bytes = match self.read_body(response).await {
            Ok(bytes) => bytes,
            Err(err) if !status.is_success() => {
                ct_debug!("Discarding unreadable error body: {}", err);
                Vec::new()
            }
            Err(err) => return Err(err),
        };

        if !status.is_success() {
            let server_message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.message);
            return Err(
                ApiError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
                    .with_server_message(server_message),
            );
        }

        let ack = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                ct_debug!("Start acknowledgement is not JSON: {}", err);
                serde_json::Value::Null
            })
        };
        Ok(Accepted(ack))
    }

    async fn fetch_status(&self) -> Result<StatusSnapshot, ApiError> {
        let url = self.endpoint(STATUS_PATH)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let bytes = self.read_body(response).await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ApiError::new(FailureKind::InvalidUrl, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
