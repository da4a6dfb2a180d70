use super::models::{
    ActionInputs, DEFAULT_API_BASE_URL, DEFAULT_SOURCE_DIR, MAX_FILE_SIZE, UploadConfig,
};
use crate::humanize::{ByteSize, ParseError};
use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Input required and not supplied: {name}")]
    MissingInput { name: &'static str },

    #[error("Invalid api_base_url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid max_file_size '{value}': {source}")]
    InvalidFileSize {
        value: String,
        #[source]
        source: ParseError,
    },

    #[error("max_file_size {requested} is above the {limit} upload limit")]
    FileSizeAboveLimit { requested: ByteSize, limit: ByteSize },
}

/// Apply defaults and turn raw inputs into an upload config
///
/// Every resolved field must be present, not only the ones without a
/// default, so a field added later without a default fails closed.
pub fn resolve(inputs: ActionInputs) -> Result<UploadConfig, ValidationError> {
    let api_base_url = inputs
        .api_base_url
        .or_else(|| Some(DEFAULT_API_BASE_URL.to_string()));
    let source_dir = inputs
        .source_dir
        .or_else(|| Some(DEFAULT_SOURCE_DIR.to_string()));

    let api_token = require("api_token", inputs.api_token)?;
    let site_id = require("site_id", inputs.site_id)?;
    let api_base_url = require("api_base_url", api_base_url)?;
    let source_dir = require("source_dir", source_dir)?;

    validate_base_url(&api_base_url)?;
    let max_file_size = match inputs.max_file_size {
        Some(raw) => parse_file_size(&raw)?,
        None => MAX_FILE_SIZE,
    };

    let mut config = UploadConfig::new(api_token, site_id, api_base_url, source_dir);
    config.max_file_size = max_file_size;
    Ok(config)
}

fn parse_file_size(raw: &str) -> Result<ByteSize, ValidationError> {
    let size: ByteSize = raw.parse().map_err(|source| ValidationError::InvalidFileSize {
        value: raw.to_string(),
        source,
    })?;

    if size > MAX_FILE_SIZE {
        return Err(ValidationError::FileSizeAboveLimit {
            requested: size,
            limit: MAX_FILE_SIZE,
        });
    }
    Ok(size)
}

fn require(name: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    value.ok_or(ValidationError::MissingInput { name })
}

fn validate_base_url(url: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidBaseUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ValidationError::InvalidBaseUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{scheme}'"),
        }),
    }
}
