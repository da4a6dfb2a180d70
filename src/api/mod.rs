//! Client side of the hosting API
//!
//! - [`SiteApi`] / [`SiteClient`] - listing and single-file multipart upload
//! - [`validate_api_access`] - read-only probe run before a batch
//! - [`get_all_files`] - recursive enumeration of the source directory
//! - [`upload_directory`] - sequential, partial-failure-tolerant batch upload

mod batch;
mod client;
mod content_type;
mod error;
mod models;
mod walk;

pub use batch::{BatchOptions, upload_directory, upload_files};
pub use client::{SiteApi, SiteClient, validate_api_access};
pub use error::{ApiError, Result};
pub use models::{FileError, FileRecord, UploadResult};
pub use walk::{WalkError, collect_files, get_all_files};
