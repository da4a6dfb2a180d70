//! Sequential upload of a whole source directory

use super::client::SiteApi;
use super::error::ApiError;
use super::models::{FileRecord, UploadResult};
use super::walk::{self, WalkError};
use crate::config::UploadConfig;
use crate::humanize::ByteSize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Per-file policy for a batch
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Remote directory the batch lands under
    pub root: String,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub max_file_size: ByteSize,
}

impl From<&UploadConfig> for BatchOptions {
    fn from(config: &UploadConfig) -> Self {
        Self {
            root: config.upload_path.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            max_file_size: config.max_file_size,
        }
    }
}

/// Enumerate `source_dir` and upload every file, one at a time
///
/// Only the walk can fail; per-file failures are recorded in the result
/// and the remaining files are still attempted.
pub async fn upload_directory(
    api: &dyn SiteApi,
    source_dir: &Path,
    options: &BatchOptions,
    cancel: &CancellationToken,
) -> Result<UploadResult, WalkError> {
    let files = walk::get_all_files(source_dir)?;
    info!(
        count = files.len(),
        source_dir = %source_dir.display(),
        "Found files to upload"
    );

    Ok(upload_files(api, &files, options, cancel).await)
}

/// Upload an already enumerated batch
///
/// The token is checked before each file. A file already in flight is
/// allowed to finish.
pub async fn upload_files(
    api: &dyn SiteApi,
    files: &[FileRecord],
    options: &BatchOptions,
    cancel: &CancellationToken,
) -> UploadResult {
    let mut result = UploadResult {
        total: files.len(),
        ..Default::default()
    };

    for file in files {
        if cancel.is_cancelled() {
            result.cancelled = true;
            warn!(
                skipped = result.skipped(),
                "Upload cancelled, remaining files skipped"
            );
            break;
        }

        if file.size > options.max_file_size.as_u64() {
            let message = format!(
                "File size {} exceeds the {} limit",
                ByteSize(file.size),
                options.max_file_size
            );
            warn!(file = %file.relative_path, "{message}");
            result.record_failure(&file.relative_path, message);
            continue;
        }

        let upload_path = remote_dir(&options.root, file);
        match upload_with_retry(api, file, &upload_path, options, cancel).await {
            Ok(_) => {
                info!(
                    file = %file.relative_path,
                    upload_path,
                    size = %ByteSize(file.size),
                    "Uploaded"
                );
                result.record_success();
            }
            Err(e) => {
                warn!(file = %file.relative_path, error = %e, "Failed to upload file");
                result.record_failure(&file.relative_path, e.to_string());
            }
        }
    }

    info!(
        total = result.total,
        success = result.success,
        failed = result.failed,
        "Upload pass finished"
    );

    result
}

/// Remote directory for a file: its local parent directory under `root`
fn remote_dir(root: &str, file: &FileRecord) -> String {
    let root = root.trim_matches('/');
    let parent = file.upload_path();

    match (root.is_empty(), parent.is_empty()) {
        (true, _) => parent.to_string(),
        (false, true) => root.to_string(),
        (false, false) => format!("{root}/{parent}"),
    }
}

async fn upload_with_retry(
    api: &dyn SiteApi,
    file: &FileRecord,
    upload_path: &str,
    options: &BatchOptions,
    cancel: &CancellationToken,
) -> Result<Value, ApiError> {
    let mut retries = 0;

    loop {
        match api.upload_file(&file.local_path, upload_path).await {
            Ok(body) => {
                if retries > 0 {
                    debug!(file = %file.relative_path, retries, "Upload succeeded after retry");
                }
                return Ok(body);
            }
            Err(e) if e.is_transient() && retries < options.max_retries => {
                retries += 1;
                // 1x, 2x, 4x ... of the base backoff
                let backoff = options.retry_backoff * 2u32.pow((retries - 1).min(10));
                warn!(
                    file = %file.relative_path,
                    retries,
                    error = %e,
                    backoff_ms = backoff.as_millis() as u64,
                    "Upload failed, retrying"
                );

                tokio::select! {
                    _ = tokio::time::sleep(backoff) => {}
                    _ = cancel.cancelled() => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}
