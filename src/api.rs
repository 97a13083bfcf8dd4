// API client module: a small blocking HTTP client for the remote drive's
// REST API (folders, upload-from-url, operation status, file metadata).
// Every call returns a `Result`, but the flow in `ui` only ever asks
// "did it work?"; the error variants exist so the logs can say why not.

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default base URL of the drive REST API.
pub const DEFAULT_API_URL: &str = "https://cloud-api.yandex.net";

const OPERATION_ID_MARKER: &str = "operation_id=";

/// Everything that can go wrong while talking to the drive. Callers treat
/// all of these the same way; the distinction only shows up in logs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("could not decode response body: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("could not decode status payload: {0}")]
    Payload(#[source] serde_json::Error),
    #[error("no operation id in link {0:?}")]
    MissingOperationId(String),
    #[error("token cannot be used in an Authorization header")]
    InvalidToken,
}

/// Result of a folder creation request. Both variants count as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderState {
    Created,
    AlreadyExists,
}

/// State reported by the operations endpoint. Anything that is not one of
/// the two terminal values is treated as still running.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    Success,
    Failed,
    #[default]
    #[serde(other)]
    InProgress,
}

/// Body of `GET /v1/disk/operations/{id}`. The body itself is kept so a
/// failed operation can be printed exactly as the drive sent it.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct OperationStatus {
    #[serde(default)]
    pub status: OperationState,
    /// Fraction in `0.0..=1.0`. Not every provider response includes it.
    #[serde(default)]
    pub progress: f64,
    #[serde(skip)]
    pub raw: Value,
}

impl OperationStatus {
    /// Decode a status body and keep the body alongside the parsed fields.
    pub fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        let mut status: OperationStatus = serde_json::from_value(raw.clone())?;
        status.raw = raw;
        Ok(status)
    }
}

/// The subset of resource metadata the manifest needs.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FileInfo {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Link object returned by asynchronous endpoints.
#[derive(Deserialize, Debug)]
struct Link {
    #[serde(default)]
    href: String,
}

/// Operations the upload flow needs from a remote drive. `DiskClient` is
/// the HTTP implementation; tests script it with a mock.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteDrive {
    /// Succeeds only when the drive root answers `200 OK`.
    fn check_token(&self) -> Result<(), ApiError>;
    /// Creates `path`; an existing folder is not an error.
    fn create_folder(&self, path: &str) -> Result<FolderState, ApiError>;
    /// Asks the drive to fetch `source_url` into `dest_path` and returns
    /// the id of the asynchronous operation doing it.
    fn upload_from_url(&self, source_url: &str, dest_path: &str) -> Result<String, ApiError>;
    fn operation_status(&self, operation_id: &str) -> Result<OperationStatus, ApiError>;
    fn file_info(&self, path: &str) -> Result<FileInfo, ApiError>;
}

/// Blocking client holding the reqwest client, the API base URL and the
/// authorization headers sent with every request.
#[derive(Clone)]
pub struct DiskClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl DiskClient {
    /// Build a client for `base_url` authenticated with an OAuth `token`.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let mut value = HeaderValue::from_str(&format!("OAuth {token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
        let client = Client::builder().timeout(timeout).build()?;
        Ok(DiskClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/disk/{}", self.base_url, path)
    }

    /// Turn a non-200 response into `UnexpectedStatus` and decode the rest.
    fn json_on_ok<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
        let status = res.status();
        if status != StatusCode::OK {
            return Err(ApiError::UnexpectedStatus(status));
        }
        res.json().map_err(ApiError::Decode)
    }
}

impl RemoteDrive for DiskClient {
    fn check_token(&self) -> Result<(), ApiError> {
        let res = self
            .client
            .get(self.endpoint(""))
            .headers(self.headers.clone())
            .send()?;
        debug!(status = %res.status(), "token check");
        match res.status() {
            StatusCode::OK => Ok(()),
            other => Err(ApiError::UnexpectedStatus(other)),
        }
    }

    fn create_folder(&self, path: &str) -> Result<FolderState, ApiError> {
        let res = self
            .client
            .put(self.endpoint("resources"))
            .headers(self.headers.clone())
            .query(&[("path", path)])
            .send()?;
        debug!(path, status = %res.status(), "create folder");
        // 409 means the folder is already there
        match res.status() {
            StatusCode::CREATED => Ok(FolderState::Created),
            StatusCode::CONFLICT => Ok(FolderState::AlreadyExists),
            other => Err(ApiError::UnexpectedStatus(other)),
        }
    }

    fn upload_from_url(&self, source_url: &str, dest_path: &str) -> Result<String, ApiError> {
        let res = self
            .client
            .post(self.endpoint("resources/upload"))
            .headers(self.headers.clone())
            .query(&[("path", dest_path), ("url", source_url)])
            .send()?;
        debug!(dest_path, status = %res.status(), "upload from url");
        if res.status() != StatusCode::ACCEPTED {
            return Err(ApiError::UnexpectedStatus(res.status()));
        }
        let link: Link = res.json().map_err(ApiError::Decode)?;
        match operation_id_from_href(&link.href) {
            Some(id) => Ok(id.to_string()),
            None => {
                warn!(href = %link.href, "upload accepted without an operation id");
                Err(ApiError::MissingOperationId(link.href))
            }
        }
    }

    fn operation_status(&self, operation_id: &str) -> Result<OperationStatus, ApiError> {
        let res = self
            .client
            .get(self.endpoint(&format!("operations/{operation_id}")))
            .headers(self.headers.clone())
            .send()?;
        debug!(operation_id, status = %res.status(), "operation status");
        let body: Value = Self::json_on_ok(res)?;
        OperationStatus::from_json(body).map_err(ApiError::Payload)
    }

    fn file_info(&self, path: &str) -> Result<FileInfo, ApiError> {
        let res = self
            .client
            .get(self.endpoint("resources"))
            .headers(self.headers.clone())
            .query(&[("path", path)])
            .send()?;
        debug!(path, status = %res.status(), "file info");
        Self::json_on_ok(res)
    }
}

/// Extract the operation id from an operation link: the text after the
/// last `operation_id=` marker, up to the next query separator.
pub fn operation_id_from_href(href: &str) -> Option<&str> {
    href.rsplit_once(OPERATION_ID_MARKER)
        .and_then(|(_, rest)| rest.split('&').next())
        .filter(|id| !id.is_empty())
}
