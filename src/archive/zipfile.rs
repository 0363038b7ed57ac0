// src/archive/zipfile.rs

use super::{ExtractStats, open_archive};
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use tracing::warn;
use zip::ZipArchive;

fn corrupt(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::Archive(format!("{}: {}", path.display(), err))
}

pub(super) fn extract(archive_path: &Path, dest: &Path) -> Result<ExtractStats> {
    let file = open_archive(archive_path)?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| corrupt(archive_path, e))?;
    let mut stats = ExtractStats::default();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|e| corrupt(archive_path, e))?;

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping zip entry with unsafe path: {}", entry.name());
            stats.skipped += 1;
            continue;
        };
        let outpath = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&outpath)
                .map_err(|e| Error::io_at("Failed to create", &outpath, e))?;
            stats.directories += 1;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io_at("Failed to create", parent, e))?;
        }

        // File::create truncates, so an existing file is overwritten in place
        let mut outfile =
            File::create(&outpath).map_err(|e| Error::io_at("Failed to write", &outpath, e))?;
        let written = io::copy(&mut entry, &mut outfile).map_err(|e| match e.kind() {
            io::ErrorKind::InvalidData => corrupt(archive_path, e),
            _ => Error::io_at("Failed to write", &outpath, e),
        })?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&outpath, fs::Permissions::from_mode(mode & 0o7777))
                .map_err(|e| Error::io_at("Failed to set permissions on", &outpath, e))?;
        }

        stats.files += 1;
        stats.bytes += written;
    }

    Ok(stats)
}
