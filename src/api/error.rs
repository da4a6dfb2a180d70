use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {}: {message}", .status.as_u16())]
    Http {
        status: StatusCode,
        message: String,
    },

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid API token or token has expired")]
    Unauthorized,

    #[error("API token does not have permission to access site '{site_id}'")]
    Forbidden { site_id: String },

    #[error("Site '{site_id}' not found, check the site_id input")]
    SiteNotFound { site_id: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Build an error from a non-success response body
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        ApiError::Http {
            status,
            message: response_message(status, body),
        }
    }

    /// HTTP status of the failed response, if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Request(e) => e.status(),
            _ => None,
        }
    }

    /// Whether trying the same request again could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::Timeout => true,
            ApiError::Request(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(e)
        }
    }
}

/// Pick the most useful message out of an error body.
/// JSON bodies with `message` or `error` win over raw text.
fn response_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }

    if !body.is_empty() {
        return body.to_string();
    }

    status.canonical_reason().unwrap_or("Unknown").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_message_is_preferred() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"message": "path must be relative"}"#,
        );
        assert_eq!(err.to_string(), "HTTP 400: path must be relative");
    }

    #[test]
    fn empty_body_falls_back_to_reason() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    }

    #[test]
    fn transient_classification() {
        assert!(ApiError::from_response(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(ApiError::from_response(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(ApiError::Timeout.is_transient());
        assert!(!ApiError::from_response(StatusCode::NOT_FOUND, "").is_transient());
        assert!(!ApiError::FileNotFound(PathBuf::from("x")).is_transient());
    }

    #[test]
    fn refined_access_errors_have_no_status() {
        assert_eq!(ApiError::Unauthorized.status(), None);
        assert_eq!(
            ApiError::SiteNotFound {
                site_id: "s".into()
            }
            .status(),
            None
        );
    }
}
