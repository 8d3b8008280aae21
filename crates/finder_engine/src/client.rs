use std::time::Duration;

use finder_core::{
    BulkJob, BulkKind, BulkOptions, EmailResult, FindRequest, RequestFailure, SubmitResponse,
    VerifyRequest, DEFAULT_API_BASE,
};
use finder_logging::{finder_debug, finder_warn};
use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::disposition::filename_from_disposition;
use crate::{CsvUpload, DownloadPayload};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    base_url: String,
    /// Bound on the single find/verify calls. Bulk calls rely on the transport default.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub poll_interval: Duration,
    pub max_download_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(1200),
            max_download_bytes: 50 * 1024 * 1024,
        }
    }
}

impl ApiSettings {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed).map_err(|err| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "expected an http or https URL".to_string(),
            });
        }
        Ok(Self {
            base_url: trimmed.to_string(),
            ..Self::default()
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn job_url(&self, job_id: &str, download: bool) -> Result<Url, RequestFailure> {
        let mut url = Url::parse(&self.endpoint("/api/jobs"))
            .map_err(|err| RequestFailure::Other(Some(err.to_string())))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| RequestFailure::Other(Some("invalid API base URL".to_string())))?;
            segments.push(job_id);
            if download {
                segments.push("download");
            }
        }
        Ok(url)
    }
}

/// The remote email finder service.
#[async_trait::async_trait]
pub trait FinderApi: Send + Sync {
    async fn find(&self, request: &FindRequest) -> Result<Vec<EmailResult>, RequestFailure>;

    async fn verify(&self, request: &VerifyRequest) -> Result<EmailResult, RequestFailure>;

    async fn submit_bulk(
        &self,
        kind: BulkKind,
        upload: CsvUpload,
        options: BulkOptions,
    ) -> Result<SubmitResponse, RequestFailure>;

    async fn job_status(&self, job_id: &str) -> Result<BulkJob, RequestFailure>;

    async fn download(&self, job_id: &str) -> Result<DownloadPayload, RequestFailure>;
}

#[derive(Debug, Clone)]
pub struct ReqwestApi {
    settings: ApiSettings,
    client: reqwest::Client,
}

impl ReqwestApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl FinderApi for ReqwestApi {
    async fn find(&self, request: &FindRequest) -> Result<Vec<EmailResult>, RequestFailure> {
        let url = self.settings.endpoint("/api/find");
        finder_debug!(
            "POST {} name_len={} domain={}",
            url,
            request.first_name.len() + request.last_name.len(),
            request.domain
        );
        let response = self
            .client
            .post(&url)
            .timeout(self.settings.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(ensure_success(response).await?).await
    }

    async fn verify(&self, request: &VerifyRequest) -> Result<EmailResult, RequestFailure> {
        let url = self.settings.endpoint("/api/verify");
        finder_debug!("POST {} email_len={}", url, request.email.len());
        let response = self
            .client
            .post(&url)
            .timeout(self.settings.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(ensure_success(response).await?).await
    }

    async fn submit_bulk(
        &self,
        kind: BulkKind,
        upload: CsvUpload,
        options: BulkOptions,
    ) -> Result<SubmitResponse, RequestFailure> {
        let url = self.settings.endpoint(kind.endpoint());
        finder_debug!(
            "POST {} file={} bytes={}",
            url,
            upload.file_name,
            upload.bytes.len()
        );
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str("text/csv")
            .map_err(map_reqwest_error)?;
        let form = Form::new()
            .part("file", part)
            .text("fast_mode", if options.fast_mode { "true" } else { "false" })
            .text("confidence_mode", options.confidence_mode.as_str());
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(ensure_success(response).await?).await
    }

    async fn job_status(&self, job_id: &str) -> Result<BulkJob, RequestFailure> {
        let url = self.settings.job_url(job_id, false)?;
        finder_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(ensure_success(response).await?).await
    }

    async fn download(&self, job_id: &str) -> Result<DownloadPayload, RequestFailure> {
        let url = self.settings.job_url(job_id, true)?;
        finder_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;

        let max_bytes = self.settings.max_download_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes));
            }
        }

        let suggested_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(too_large(max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(DownloadPayload {
            bytes,
            suggested_name,
        })
    }
}

/// Turns a non-2xx response into `Rejected`, keeping the server's `detail`.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RequestFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let detail = extract_detail(&body);
    finder_warn!("server answered {} detail={:?}", status, detail);
    Err(RequestFailure::Rejected {
        status: status.as_u16(),
        detail,
    })
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, RequestFailure> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| RequestFailure::Malformed(err.to_string()))
}

fn extract_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn too_large(max_bytes: u64) -> RequestFailure {
    RequestFailure::Other(Some(format!(
        "Result file exceeds the {max_bytes} byte download limit."
    )))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> RequestFailure {
    if err.is_timeout() {
        return RequestFailure::Timeout;
    }
    if err.is_decode() {
        return RequestFailure::Malformed(err.to_string());
    }
    if err.is_connect() || err.is_request() {
        return RequestFailure::Unreachable;
    }
    RequestFailure::Other(Some(err.to_string()))
}
