// src/filesystem/path.rs

//! Path validation for manifest-supplied names
//!
//! Entry names and package directory names come from a manifest that may have
//! been authored elsewhere. They are joined onto the target root and the backup
//! root, so they must stay relative and must never climb out with `..`.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Normalize a relative path from a manifest
///
/// - `.` components are dropped
/// - `..` components are rejected
/// - absolute paths (leading `/` or a drive prefix) are rejected
/// - paths that normalize to nothing are rejected
///
/// # Examples
///
/// ```
/// use safe_unpack::filesystem::path::relative_path;
/// use std::path::PathBuf;
///
/// assert_eq!(relative_path("x/./y.bin").unwrap(), PathBuf::from("x/y.bin"));
/// assert!(relative_path("../escape").is_err());
/// assert!(relative_path("/etc/passwd").is_err());
/// ```
pub fn relative_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let display = path.to_string_lossy();

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(display.to_string()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidPath(format!(
                    "Expected a relative path, got {}",
                    display
                )));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidPath(format!(
            "Path is empty after normalization: {:?}",
            display
        )));
    }

    Ok(normalized)
}

/// Join `root` with a manifest-supplied relative path
pub fn safe_join(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf> {
    Ok(root.as_ref().join(relative_path(path)?))
}

/// Validate a backup directory prefix
///
/// The prefix becomes the leading part of a single directory name, so it
/// may not contain separators.
pub fn validate_prefix(prefix: &str) -> Result<&str> {
    if prefix.is_empty() {
        return Err(Error::InvalidPath("Backup prefix is empty".to_string()));
    }
    if prefix.contains('/') || prefix.contains('\\') || prefix == "." || prefix == ".." {
        return Err(Error::PathTraversal(format!(
            "Backup prefix must be a single name: {}",
            prefix
        )));
    }
    Ok(prefix)
}
