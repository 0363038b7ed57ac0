// src/archive/mod.rs

//! Archive extraction
//!
//! Packages ship as zip files or tarballs (optionally gzip, xz, or zstd
//! compressed). Extraction always overwrites whatever already sits at an
//! entry's destination, which is why the installer backs up conflicts first.
//!
//! Entries whose paths would escape the destination (absolute paths, `..`)
//! are skipped and counted rather than written.

mod tarball;
mod zipfile;

use crate::compression::CompressionFormat;
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::debug;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const USTAR_OFFSET: usize = 257;
const USTAR_MAGIC: &[u8] = b"ustar";

/// Container format of a package archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar(CompressionFormat),
}

impl ArchiveFormat {
    /// Detect the format from the file name alone
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            return Some(Self::Zip);
        }

        let tarball = [".tar", ".tar.gz", ".tgz", ".tar.xz", ".txz", ".tar.zst", ".tar.zstd"];
        if tarball.iter().any(|ext| lower.ends_with(ext)) {
            return Some(Self::Tar(CompressionFormat::from_extension(&lower)));
        }

        None
    }

    /// Detect the format from the leading bytes of the file
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(ZIP_MAGIC) || data.starts_with(ZIP_EMPTY_MAGIC) {
            return Some(Self::Zip);
        }

        match CompressionFormat::from_magic_bytes(data) {
            CompressionFormat::None => {
                let ustar = data.get(USTAR_OFFSET..USTAR_OFFSET + USTAR_MAGIC.len());
                (ustar == Some(USTAR_MAGIC)).then_some(Self::Tar(CompressionFormat::None))
            }
            compressed => Some(Self::Tar(compressed)),
        }
    }

    /// Detect the format of an archive on disk, by name first and content second
    pub fn detect(path: &Path) -> Result<Self> {
        if let Some(format) = path.file_name().and_then(|n| n.to_str()).and_then(Self::from_name) {
            return Ok(format);
        }

        let mut file = open_archive(path)?;
        let mut header = Vec::with_capacity(512);
        file.by_ref()
            .take(512)
            .read_to_end(&mut header)
            .map_err(|e| Error::Archive(format!("{}: {}", path.display(), e)))?;

        Self::from_magic_bytes(&header)
            .ok_or_else(|| Error::UnsupportedArchive(path.display().to_string()))
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zip => write!(f, "zip"),
            Self::Tar(CompressionFormat::None) => write!(f, "tar"),
            Self::Tar(compression) => write!(f, "tar+{}", compression),
        }
    }
}

/// Counters collected while extracting one archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
    /// Entries refused because their path was unsafe
    pub skipped: usize,
}

/// Extracts an archive into a destination directory, overwriting existing files
pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<ExtractStats>;
}

/// Extractor for zip and tar archives
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExtractor;

impl ArchiveExtractor for DefaultExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<ExtractStats> {
        let format = ArchiveFormat::detect(archive)?;
        fs::create_dir_all(dest).map_err(|e| Error::io_at("Failed to create", dest, e))?;

        debug!("Extracting {} ({}) into {}", archive.display(), format, dest.display());

        let stats = match format {
            ArchiveFormat::Zip => zipfile::extract(archive, dest)?,
            ArchiveFormat::Tar(compression) => tarball::extract(archive, compression, dest)?,
        };

        debug!(
            "Extracted {} files, {} directories ({} bytes, {} skipped)",
            stats.files, stats.directories, stats.bytes, stats.skipped
        );
        Ok(stats)
    }
}

/// Open an archive, reporting a missing file as an archive problem
fn open_archive(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::Archive(format!("Archive not found: {}", path.display()))
        }
        _ => Error::io_at("Failed to open archive", path, e),
    })
}
