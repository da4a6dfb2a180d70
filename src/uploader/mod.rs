//! Upload lifecycle: validate, probe, upload, report
//!
//! ```text
//! pending -> uploading -> success | failed
//!    \__________\______-> cancelled
//! ```
//!
//! `failed` covers partial failure too: one failed file fails the run.

mod status;

pub use status::{UploadInfo, UploadStatus};

use crate::api::{
    ApiError, BatchOptions, SiteApi, SiteClient, WalkError, upload_directory, validate_api_access,
};
use crate::config::{BuildInfo, Context, MAX_TIMEOUT_MS, UploadConfig};
use crate::outputs::{ActionOutputs, OutputError};
use chrono::Utc;
use reqwest::StatusCode;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Source directory does not exist: {}", .0.display())]
    SourceDirMissing(PathBuf),

    #[error("Source path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to inspect source directory {}: {source}", .path.display())]
    SourceDirIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Api(ApiError),

    #[error("{message}")]
    Remote { status: StatusCode, message: String },

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("No upload was attempted")]
    NotStarted,

    #[error("{failed} of {total} files failed to upload")]
    PartialFailure { failed: usize, total: usize },

    #[error("Upload failed: {0}")]
    Aborted(String),

    #[error("Upload was cancelled")]
    Cancelled,

    #[error("Upload did not finish (status: {0})")]
    Unfinished(UploadStatus),
}

impl UploadError {
    /// Turn an HTTP failure into a message aimed at whoever reads the run log.
    /// Errors without a status pass through unchanged.
    pub fn from_api(err: ApiError) -> Self {
        let Some(status) = err.status() else {
            return UploadError::Api(err);
        };

        let message = match status.as_u16() {
            400 => match &err {
                ApiError::Http { message, .. } => format!("Bad request: {message}"),
                other => format!("Bad request: {other}"),
            },
            401 => "Authentication failed: the API token is invalid or has expired".to_string(),
            403 => "Permission denied: the API token cannot upload to this site".to_string(),
            404 => "Not found: the site or upload path does not exist".to_string(),
            code @ 500..=599 => {
                format!("Server error (HTTP {code}): the hosting API is unavailable, try again later")
            }
            _ => format!("Upload request failed: {err}"),
        };

        UploadError::Remote { status, message }
    }
}

/// Drives one upload run and holds its status
pub struct Uploader {
    config: UploadConfig,
    build: BuildInfo,
    api: Arc<dyn SiteApi>,
    cancel: CancellationToken,
    status: UploadStatus,
    info: Option<UploadInfo>,
    failure: Option<String>,
}

impl Uploader {
    pub fn new(context: Context, api: Arc<dyn SiteApi>, cancel: CancellationToken) -> Self {
        Self {
            config: context.config,
            build: context.build,
            api,
            cancel,
            status: UploadStatus::Pending,
            info: None,
            failure: None,
        }
    }

    /// Uploader talking to the site named in the context
    pub fn from_context(context: Context, cancel: CancellationToken) -> Result<Self, ApiError> {
        let client = SiteClient::new(&context.config)?;
        Ok(Self::new(context, Arc::new(client), cancel))
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn info(&self) -> Option<&UploadInfo> {
        self.info.as_ref()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Validate, probe access, then upload the whole source directory
    ///
    /// Any error leaves the status at `failed` and is returned. Per-file
    /// failures are not errors here; they show up in [`Uploader::info`].
    pub async fn create(&mut self) -> Result<(), UploadError> {
        match self.run().await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(error = %e, "Upload failed");
                self.status = UploadStatus::Failed;
                self.failure = Some(e.to_string());
                if let Some(info) = self.info.as_mut() {
                    info.finished_at.get_or_insert_with(Utc::now);
                }
                Err(e)
            }
        }
    }

    async fn run(&mut self) -> Result<(), UploadError> {
        self.clamp_timeout();
        self.validate_config()?;
        let source_dir = self.resolve_source_dir()?;

        validate_api_access(self.api.as_ref())
            .await
            .map_err(UploadError::from_api)?;

        let started_at = Utc::now();
        let id = self
            .build
            .commit
            .clone()
            .unwrap_or_else(|| started_at.timestamp_millis().to_string());
        self.info = Some(UploadInfo::started(id, started_at));
        self.status = UploadStatus::Uploading;

        info!(
            site_id = %self.config.site_id,
            source_dir = %source_dir.display(),
            "Starting upload"
        );

        let options = BatchOptions::from(&self.config);
        let result =
            upload_directory(self.api.as_ref(), &source_dir, &options, &self.cancel).await?;

        self.status = if result.cancelled {
            UploadStatus::Cancelled
        } else if result.failed == 0 {
            UploadStatus::Success
        } else {
            UploadStatus::Failed
        };

        if let Some(info) = self.info.as_mut() {
            info.result = result;
            info.finished_at = Some(Utc::now());
        }

        info!(status = %self.status, "Upload finished");
        Ok(())
    }

    fn clamp_timeout(&mut self) {
        if self.config.timeout_ms > MAX_TIMEOUT_MS {
            warn!(
                requested_ms = self.config.timeout_ms,
                max_ms = MAX_TIMEOUT_MS,
                "Timeout above maximum, clamping"
            );
            self.config.timeout_ms = MAX_TIMEOUT_MS;
        }
    }

    fn validate_config(&self) -> Result<(), UploadError> {
        if self.config.api_token.trim().is_empty() {
            return Err(UploadError::MissingField("API token"));
        }
        if self.config.site_id.trim().is_empty() {
            return Err(UploadError::MissingField("Site ID"));
        }
        if self.config.api_base_url.trim().is_empty() {
            return Err(UploadError::MissingField("API base URL"));
        }
        if self.config.source_dir.as_os_str().is_empty() {
            return Err(UploadError::MissingField("Source directory"));
        }
        Ok(())
    }

    fn resolve_source_dir(&self) -> Result<PathBuf, UploadError> {
        let path = std::path::absolute(&self.config.source_dir).map_err(|source| {
            UploadError::SourceDirIo {
                path: self.config.source_dir.clone(),
                source,
            }
        })?;

        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Ok(path),
            Ok(_) => Err(UploadError::NotADirectory(path)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(UploadError::SourceDirMissing(path)),
            Err(source) => Err(UploadError::SourceDirIo { path, source }),
        }
    }

    /// Report the final state through `outputs`
    ///
    /// Only `success` returns `Ok`. Every other state has already had its
    /// `status` output written when the error comes back.
    pub fn check(&self, outputs: &mut dyn ActionOutputs) -> Result<(), UploadError> {
        let Some(info) = &self.info else {
            return Err(UploadError::NotStarted);
        };

        if let Some(ms) = info.duration_ms() {
            outputs.set_output("duration", &ms.to_string())?;
        }

        if info.result.failed > 0 {
            let lines: Vec<String> = info
                .result
                .errors
                .iter()
                .map(|e| format!("  - {}: {}", e.file, e.error))
                .collect();
            outputs.warning(&format!(
                "{} file(s) failed to upload:\n{}",
                info.result.failed,
                lines.join("\n")
            ));
        }

        outputs.set_output("status", self.status.as_str())?;

        match self.status {
            UploadStatus::Success => {
                let serialized = serde_json::to_string(info)
                    .map_err(|e| UploadError::Aborted(format!("cannot serialize result: {e}")))?;
                outputs.set_output("upload_result", &serialized)?;
                outputs.set_output("total_files", &info.result.total.to_string())?;
                outputs.set_output("success_files", &info.result.success.to_string())?;
                outputs.set_output("failed_files", &info.result.failed.to_string())?;

                info!(
                    total = info.result.total,
                    success = info.result.success,
                    duration_ms = info.duration_ms(),
                    "Upload completed"
                );
                Ok(())
            }
            UploadStatus::Failed if info.result.failed > 0 => Err(UploadError::PartialFailure {
                failed: info.result.failed,
                total: info.result.total,
            }),
            UploadStatus::Failed => Err(UploadError::Aborted(
                self.failure.clone().unwrap_or_else(|| "unknown error".to_string()),
            )),
            UploadStatus::Cancelled => Err(UploadError::Cancelled),
            other => Err(UploadError::Unfinished(other)),
        }
    }

    /// Upload and report, giving up as soon as the cancel token fires
    ///
    /// A cancelled run still writes `status=cancelled` before returning
    /// [`UploadError::Cancelled`].
    pub async fn run_to_completion(
        &mut self,
        outputs: &mut dyn ActionOutputs,
    ) -> Result<(), UploadError> {
        let token = self.cancel.clone();
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(UploadError::Cancelled),
            result = async {
                self.create().await?;
                self.check(&mut *outputs)
            } => result,
        };

        if let Err(e) = &outcome {
            self.cancel();
            if matches!(e, UploadError::Cancelled) {
                if let Err(output_err) = outputs.set_output("status", "cancelled") {
                    warn!(error = %output_err, "Failed to record cancelled status");
                }
            }
        }

        outcome
    }

    /// Mark a running upload cancelled
    ///
    /// Does nothing before an upload starts or after it finished. Requests
    /// already sent are not aborted; the batch stops before its next file.
    pub fn cancel(&mut self) {
        if self.status.is_finished() {
            return;
        }
        let Some(info) = self.info.as_mut() else {
            return;
        };

        info.result.cancelled = true;
        info.finished_at.get_or_insert_with(Utc::now);
        self.status = UploadStatus::Cancelled;
        self.cancel.cancel();
        warn!(upload_id = %info.id, "Upload cancelled");
    }
}
