// src/filesystem/mover.rs

//! Rename-style moves for files and whole directory trees
//!
//! Both moves try `rename(2)` first. When the source and destination live on
//! different filesystems the kernel answers `EXDEV`, and the move falls back to
//! copying and then deleting the source.

use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

/// Move a single file, falling back to copy + fsync + delete across filesystems
///
/// Refuses to replace anything already at `dst`.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    refuse_existing(dst)?;
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(
                "Cross-filesystem move detected ({} -> {}), using copy fallback",
                src.display(),
                dst.display()
            );
            move_file_by_copy(src, dst)
        }
        Err(e) => Err(Error::io_at("Failed to move", src, e)),
    }
}

/// Copy `src` to `dst`, then delete `src`. A failed copy removes `dst`.
pub(crate) fn move_file_by_copy(src: &Path, dst: &Path) -> Result<()> {
    refuse_existing(dst)?;
    copy_file_durable(src, dst).inspect_err(|_| {
        let _ = fs::remove_file(dst);
    })?;
    fs::remove_file(src).map_err(|e| Error::io_at("Failed to remove", src, e))
}

fn refuse_existing(dst: &Path) -> Result<()> {
    if dst.symlink_metadata().is_ok() {
        return Err(Error::IoError(format!(
            "Destination already exists: {}",
            dst.display()
        )));
    }
    Ok(())
}

/// Move a directory and everything below it
///
/// Refuses to replace anything already at `dst`, including an empty
/// directory. A failed cross-filesystem copy removes whatever it wrote at
/// `dst` and leaves `src` untouched before returning the error.
pub fn move_dir(src: &Path, dst: &Path) -> Result<()> {
    refuse_existing(dst)?;
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(
                "Cross-filesystem directory move ({} -> {}), copying tree",
                src.display(),
                dst.display()
            );
            move_dir_by_copy(src, dst)
        }
        Err(e) => Err(Error::io_at("Failed to move", src, e)),
    }
}

/// Copy `src` to `dst`, then delete `src`
pub(crate) fn move_dir_by_copy(src: &Path, dst: &Path) -> Result<()> {
    refuse_existing(dst)?;

    if let Err(e) = copy_tree(src, dst) {
        if dst.exists()
            && let Err(cleanup) = fs::remove_dir_all(dst)
        {
            warn!(
                "Failed to clean up partial copy at {}: {}",
                dst.display(),
                cleanup
            );
        }
        return Err(e);
    }

    fs::remove_dir_all(src).map_err(|e| Error::io_at("Failed to remove", src, e))
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry
            .map_err(|e| Error::IoError(format!("Failed to walk {}: {}", src.display(), e)))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::InvalidPath(e.to_string()))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| Error::io_at("Failed to create", &target, e))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            copy_file_durable(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let link = fs::read_link(src).map_err(|e| Error::io_at("Failed to read link", src, e))?;
    std::os::unix::fs::symlink(&link, dst)
        .map_err(|e| Error::io_at("Failed to create symlink", dst, e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|e| Error::io_at("Failed to copy", src, e))
}

fn copy_file_durable(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst).map_err(|e| Error::io_at("Failed to copy", src, e))?;
    let file = File::open(dst)?;
    file.sync_all()?;
    drop(file);

    // Not every filesystem supports fsync on a directory
    if let Some(parent) = dst.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// True when `path` is a directory with no entries
pub fn is_dir_empty(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| Error::io_at("Failed to read", path, e))?;
    Ok(entries.next().is_none())
}
