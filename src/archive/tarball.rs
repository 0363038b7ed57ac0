// src/archive/tarball.rs

use super::{ExtractStats, open_archive};
use crate::compression::{CompressionFormat, create_decoder};
use crate::error::{Error, Result};
use std::io::{self, BufReader};
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::warn;

fn read_error(path: &Path, err: io::Error) -> Error {
    Error::Archive(format!("{}: {}", path.display(), err))
}

pub(super) fn extract(
    archive_path: &Path,
    compression: CompressionFormat,
    dest: &Path,
) -> Result<ExtractStats> {
    let file = open_archive(archive_path)?;
    let decoder = create_decoder(BufReader::new(file), compression)?;
    let mut archive = Archive::new(decoder);
    archive.set_overwrite(true);

    let mut stats = ExtractStats::default();
    let entries = archive.entries().map_err(|e| read_error(archive_path, e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| read_error(archive_path, e))?;
        let entry_type = entry.header().entry_type();
        let size = entry.size();
        let name = entry
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        // unpack_in refuses paths that would land outside dest
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| Error::IoError(format!("Failed to extract {}: {}", name, e)))?;
        if !unpacked {
            warn!("Skipping tar entry with unsafe path: {}", name);
            stats.skipped += 1;
            continue;
        }

        match entry_type {
            EntryType::Directory => stats.directories += 1,
            EntryType::Regular | EntryType::Continuous => {
                stats.files += 1;
                stats.bytes += size;
            }
            _ => stats.files += 1,
        }
    }

    Ok(stats)
}
