use crate::humanize::ByteSize;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Hard ceiling for any single request, in milliseconds
pub const MAX_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_API_BASE_URL: &str = "https://api.example.com";
pub const DEFAULT_SOURCE_DIR: &str = "./dist";
/// Remote directory every batch is uploaded under
pub const ROOT_UPLOAD_PATH: &str = "/";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
pub const MAX_FILE_SIZE: ByteSize = ByteSize::mib(100);

/// Inputs as supplied by the invoking environment, before defaults
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionInputs {
    pub api_token: Option<String>,
    pub site_id: Option<String>,
    pub api_base_url: Option<String>,
    pub source_dir: Option<String>,
    /// Per-file limit such as "25MB", capped at [`MAX_FILE_SIZE`]
    pub max_file_size: Option<String>,
}

/// Settings for one upload run
#[derive(Clone)]
pub struct UploadConfig {
    pub api_token: String,
    pub site_id: String,
    pub api_base_url: String,
    pub source_dir: PathBuf,
    pub upload_path: String,
    pub timeout_ms: u64,
    /// Extra attempts per file after the first one, transient failures only
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub max_file_size: ByteSize,
}

impl UploadConfig {
    /// Config with the fixed run settings and the given identity
    pub fn new(
        api_token: impl Into<String>,
        site_id: impl Into<String>,
        api_base_url: impl Into<String>,
        source_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api_token: api_token.into(),
            site_id: site_id.into(),
            api_base_url: api_base_url.into(),
            source_dir: source_dir.into(),
            upload_path: ROOT_UPLOAD_PATH.to_string(),
            timeout_ms: MAX_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            max_file_size: MAX_FILE_SIZE,
        }
    }
}

// The token never reaches the logs.
impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("api_token", &"***")
            .field("site_id", &self.site_id)
            .field("api_base_url", &self.api_base_url)
            .field("source_dir", &self.source_dir)
            .field("upload_path", &self.upload_path)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("max_file_size", &self.max_file_size)
            .finish()
    }
}

/// Who triggered the run. Logged, never used for control flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    pub run_id: Option<String>,
    pub repository: Option<String>,
    pub commit: Option<String>,
}

/// Everything the uploader needs from the environment
#[derive(Debug, Clone)]
pub struct Context {
    pub config: UploadConfig,
    pub build: BuildInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_uses_fixed_settings() {
        let config = UploadConfig::new("tok", "site-1", "https://api.test", "./dist");

        assert_eq!(config.upload_path, "/");
        assert_eq!(config.timeout_ms, 600_000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_file_size.as_u64(), 100 * 1024 * 1024);
    }

    #[test]
    fn debug_output_hides_token() {
        let config = UploadConfig::new("super-secret", "site-1", "https://api.test", "./dist");
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("site-1"));
    }
}
