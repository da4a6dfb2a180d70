//! HTTP client for the hosting API

use super::content_type;
use super::error::{ApiError, Result};
use crate::config::{MAX_TIMEOUT_MS, UploadConfig};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use serde_json::Value;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("sitepush/", env!("CARGO_PKG_VERSION"));

/// Operations the uploader needs from the remote site
#[async_trait]
pub trait SiteApi: Send + Sync {
    fn site_id(&self) -> &str;

    /// List the entries of a remote directory, the root when `path` is `None`
    async fn list_files(&self, path: Option<&str>) -> Result<Value>;

    /// Upload one local file into the remote directory `upload_path`
    async fn upload_file(&self, file_path: &Path, upload_path: &str) -> Result<Value>;
}

/// Bearer-authenticated client for one site
#[derive(Clone)]
pub struct SiteClient {
    client: Client,
    base_url: String,
    site_id: String,
    api_token: String,
}

impl SiteClient {
    pub fn new(config: &UploadConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_millis(config.timeout_ms.min(MAX_TIMEOUT_MS)))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            site_id: config.site_id.clone(),
            api_token: config.api_token.clone(),
        })
    }

    fn files_url(&self) -> String {
        format!("{}/sites/{}/files", self.base_url, self.site_id)
    }
}

#[async_trait]
impl SiteApi for SiteClient {
    fn site_id(&self) -> &str {
        &self.site_id
    }

    async fn list_files(&self, path: Option<&str>) -> Result<Value> {
        let mut request = self
            .client
            .get(self.files_url())
            .bearer_auth(&self.api_token);

        if let Some(path) = path {
            request = request.query(&[("path", path)]);
        }

        let response = request.send().await.map_err(ApiError::from_reqwest)?;
        read_body(response).await
    }

    async fn upload_file(&self, file_path: &Path, upload_path: &str) -> Result<Value> {
        let io_error = |source: io::Error| {
            if source.kind() == io::ErrorKind::NotFound {
                ApiError::FileNotFound(file_path.to_path_buf())
            } else {
                ApiError::Io {
                    path: file_path.to_path_buf(),
                    source,
                }
            }
        };

        let size = tokio::fs::metadata(file_path).await.map_err(io_error)?.len();
        let file = tokio::fs::File::open(file_path).await.map_err(io_error)?;

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let part = Part::stream_with_length(Body::wrap_stream(ReaderStream::new(file)), size)
            .file_name(file_name)
            .mime_str(content_type::for_path(file_path).as_ref())?;

        let mut form = Form::new().part("file", part);
        if !upload_path.is_empty() {
            form = form.text("path", upload_path.to_string());
        }

        debug!(file = %file_path.display(), upload_path, size, "Uploading file");

        let response = self
            .client
            .post(self.files_url())
            .bearer_auth(&self.api_token)
            .query(&[("path", upload_path)])
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        read_body(response).await
    }
}

/// Decode a response body, failing on non-success status.
/// Bodies that are not JSON come back as a string value.
async fn read_body(response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await.map_err(ApiError::from_reqwest)?;

    if !status.is_success() {
        return Err(ApiError::from_response(status, &body));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(_) => Ok(Value::String(body)),
    }
}

/// Probe the site with a read-only listing before committing to a batch
///
/// 401, 403 and 404 become dedicated errors; anything else is returned
/// as the probe produced it.
pub async fn validate_api_access(api: &dyn SiteApi) -> Result<()> {
    let site_id = api.site_id().to_string();

    match api.list_files(None).await {
        Ok(_) => {
            info!(site_id, "API access validated");
            Ok(())
        }
        Err(e) => {
            let refined = match e.status() {
                Some(StatusCode::UNAUTHORIZED) => ApiError::Unauthorized,
                Some(StatusCode::FORBIDDEN) => ApiError::Forbidden { site_id },
                Some(StatusCode::NOT_FOUND) => ApiError::SiteNotFound { site_id },
                _ => e,
            };
            error!(error = %refined, "API access validation failed");
            Err(refined)
        }
    }
}
