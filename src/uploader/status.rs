use crate::api::UploadResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Lifecycle of one upload run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Failed,
    Cancelled,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Success => "success",
            UploadStatus::Failed => "failed",
            UploadStatus::Cancelled => "cancelled",
        }
    }

    /// Success and failure are final; cancellation cannot rewind them
    pub fn is_finished(&self) -> bool {
        matches!(self, UploadStatus::Success | UploadStatus::Failed)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of an attempted upload, serialized into the `upload_result` output
#[derive(Debug, Clone, Serialize)]
pub struct UploadInfo {
    /// Build commit when known, otherwise the start time in milliseconds
    pub id: String,
    #[serde(flatten)]
    pub result: UploadResult,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl UploadInfo {
    pub fn started(id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            result: UploadResult::default(),
            started_at,
            finished_at: None,
        }
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn status_strings() {
        assert_eq!(UploadStatus::Success.to_string(), "success");
        assert_eq!(
            serde_json::to_string(&UploadStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert!(UploadStatus::Failed.is_finished());
        assert!(!UploadStatus::Uploading.is_finished());
    }

    #[test]
    fn info_serializes_flat() {
        let started = Utc::now();
        let mut info = UploadInfo::started("abc123".to_string(), started);
        info.result.total = 2;
        info.result.record_success();
        info.result.record_failure("css/style.css", "HTTP 500: down");
        info.finished_at = Some(started + Duration::milliseconds(1500));

        let value = serde_json::to_value(&info).unwrap();

        assert_eq!(value["id"], "abc123");
        assert_eq!(value["total"], 2);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["errors"][0]["file"], "css/style.css");
        assert_eq!(value["cancelled"], false);
        assert_eq!(info.duration_ms(), Some(1500));
    }

    #[test]
    fn no_duration_until_finished() {
        let info = UploadInfo::started("x".to_string(), Utc::now());
        assert_eq!(info.duration_ms(), None);
    }
}
