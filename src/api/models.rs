use serde::Serialize;
use std::path::PathBuf;

/// A regular file found under the source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub local_path: PathBuf,
    /// Path below the source directory, always `/`-separated
    pub relative_path: String,
    pub name: String,
    pub size: u64,
}

impl FileRecord {
    /// Remote directory this file belongs in, `""` for the site root
    pub fn upload_path(&self) -> &str {
        match self.relative_path.rsplit_once('/') {
            Some((parent, _)) => parent,
            None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

/// Counts for one pass over the batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<FileError>,
    /// Set when the pass stopped early on cancellation
    pub cancelled: bool,
}

impl UploadResult {
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_failure(&mut self, file: impl Into<String>, error: impl Into<String>) {
        self.failed += 1;
        self.errors.push(FileError {
            file: file.into(),
            error: error.into(),
        });
    }

    /// Files that were never attempted
    pub fn skipped(&self) -> usize {
        self.total.saturating_sub(self.success + self.failed)
    }
}
