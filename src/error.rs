// src/error.rs

//! Error types for safe-unpack

use crate::compression::CompressionError;
use thiserror::Error;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while planning backups, moving files, or extracting archives
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path traversal rejected: {0}")]
    PathTraversal(String),

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("Could not allocate a unique backup directory: {0}")]
    BackupCollision(String),

    #[error(transparent)]
    Compression(#[from] CompressionError),
}

/// Coarse classification of failures, used when reporting install outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Permission denied, disk full, failed move, bad path
    Filesystem,
    /// Missing, corrupt, or unsupported archive
    Archive,
    /// Anything else
    Unexpected,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_)
            | Self::IoError(_)
            | Self::InvalidPath(_)
            | Self::PathTraversal(_)
            | Self::BackupCollision(_) => ErrorKind::Filesystem,
            Self::Archive(_) | Self::UnsupportedArchive(_) | Self::Compression(_) => {
                ErrorKind::Archive
            }
            Self::Manifest(_) => ErrorKind::Unexpected,
        }
    }

    /// Build an `IoError` that names the path involved
    pub(crate) fn io_at(action: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        Self::IoError(format!("{} {}: {}", action, path.display(), err))
    }
}
