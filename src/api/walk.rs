//! Recursive enumeration of the source directory

use super::models::FileRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("Failed to read directory tree: {0}")]
    ReadDir(#[from] walkdir::Error),

    #[error("{} is not below {}", path.display(), base.display())]
    OutsideBase { path: PathBuf, base: PathBuf },
}

/// Every regular file below `dir`, relative to `dir`
pub fn get_all_files(dir: &Path) -> Result<Vec<FileRecord>, WalkError> {
    collect_files(dir, dir)
}

/// Every regular file below `dir`, with relative paths computed from `base`
///
/// Order follows the filesystem's directory order and is not stable.
/// Any unreadable entry aborts the whole walk.
pub fn collect_files(dir: &Path, base: &Path) -> Result<Vec<FileRecord>, WalkError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(base)
            .map_err(|_| WalkError::OutsideBase {
                path: entry.path().to_path_buf(),
                base: base.to_path_buf(),
            })?;

        let size = entry.metadata()?.len();

        files.push(FileRecord {
            local_path: entry.path().to_path_buf(),
            relative_path: to_posix(relative),
            name: entry.file_name().to_string_lossy().into_owned(),
            size,
        });
    }

    Ok(files)
}

fn to_posix(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
