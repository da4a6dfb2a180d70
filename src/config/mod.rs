//! Run configuration for sitepush
//!
//! Inputs are layered from:
//! 1. An optional TOML file (`--config` or `SITEPUSH_CONFIG`)
//! 2. A `.env` file in the working directory
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! The hosting runner exports action inputs as `INPUT_<NAME>`:
//! - `INPUT_API_TOKEN` (required, secret)
//! - `INPUT_SITE_ID` (required)
//! - `INPUT_API_BASE_URL` (default `https://api.example.com`)
//! - `INPUT_SOURCE_DIR` (default `./dist`)
//! - `INPUT_MAX_FILE_SIZE` (default and ceiling `100MB`)
//!
//! Build identity is taken from `GITHUB_RUN_ID`, `GITHUB_REPOSITORY` and
//! `GITHUB_SHA` and only ever logged.
//!
//! ```no_run
//! use sitepush::config::Context;
//!
//! let ctx = Context::load(None).expect("inputs missing");
//! println!("uploading {} to site {}", ctx.config.source_dir.display(), ctx.config.site_id);
//! ```

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{
    ActionInputs, BuildInfo, Context, DEFAULT_API_BASE_URL, DEFAULT_SOURCE_DIR, MAX_FILE_SIZE,
    MAX_TIMEOUT_MS, ROOT_UPLOAD_PATH, UploadConfig,
};
pub use validation::ValidationError;

use config::Environment;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load inputs: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("{0}")]
    ValidationError(#[from] ValidationError),
}

impl Context {
    /// Build the run context from the invoking environment
    ///
    /// # Errors
    ///
    /// Fails before any network call when a required input is absent or
    /// the input file is malformed.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let inputs = sources::load(config_path)?;
        let config = validation::resolve(inputs)?;

        Ok(Self {
            config,
            build: sources::build_info(),
        })
    }

    /// Build a context from an explicit file and environment source
    pub fn load_from_sources(
        config_path: Option<PathBuf>,
        environment: Environment,
        build: BuildInfo,
    ) -> Result<Self, ConfigError> {
        let inputs = sources::load_from_sources(config_path, environment)?;
        let config = validation::resolve(inputs)?;

        Ok(Self { config, build })
    }
}
