// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// A scratch area with a `packages/` dir for archives and a `target/` dir to install into.
///
/// Keep the struct alive for the duration of the test to prevent cleanup.
pub struct Sandbox {
    _temp: TempDir,
    pub packages: PathBuf,
    pub target: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let packages = temp.path().join("packages");
        let target = temp.path().join("target");
        fs::create_dir_all(&packages).unwrap();
        fs::create_dir_all(&target).unwrap();
        Self {
            _temp: temp,
            packages,
            target,
        }
    }

    /// Write a file under the target, creating parent directories
    pub fn seed(&self, relative: &str, content: &str) {
        let path = self.target.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    pub fn read_target(&self, relative: &str) -> String {
        fs::read_to_string(self.target.join(relative)).unwrap()
    }

    /// Entries directly under the target, sorted by name
    pub fn target_listing(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.target)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Backup directories currently present under the target
    pub fn backup_dirs(&self, prefix: &str) -> Vec<PathBuf> {
        fs::read_dir(&self.target)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.is_dir()
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&format!("{}-", prefix)))
            })
            .collect()
    }

    /// Build a zip archive in `packages/`. Names ending in `/` become directories.
    pub fn zip(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let path = self.packages.join(name);
        write_zip(&path, files);
        path
    }

    /// Build a gzip-compressed tarball in `packages/`
    pub fn tar_gz(&self, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let path = self.packages.join(name);
        write_tar_gz(&path, files);
        path
    }
}

pub fn write_zip(path: &Path, files: &[(&str, &str)]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in files {
        if name.ends_with('/') {
            writer
                .add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())
                .unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap();
}

pub fn write_tar_gz(path: &Path, files: &[(&str, &str)]) {
    let encoder = flate2::write::GzEncoder::new(
        File::create(path).unwrap(),
        flate2::Compression::default(),
    );
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}
