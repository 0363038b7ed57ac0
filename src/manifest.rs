// src/manifest.rs
//! Install manifest: the ordered list of packages and the entries they carry
//!
//! A manifest is usually authored as TOML:
//!
//! ```toml
//! [[package]]
//! archive = "base.zip"
//! description = "base game files"
//!
//! [[package.entry]]
//! name = "game.exe"
//! type = "file"
//!
//! [[package]]
//! archive = "maps.tar.gz"
//! directory = "maps"
//! description = "multiplayer maps"
//!
//! [[package.entry]]
//! name = "bloodgulch"
//! type = "directory"
//! ```
//!
//! Package order is install order.

use crate::error::{Error, Result};
use crate::filesystem::path::relative_path;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Whether an entry names a file or a directory
///
/// Decided when the manifest is authored and never inferred from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// One file or directory shipped by a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Path relative to the package's effective directory
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::Directory,
        }
    }
}

/// One archive plus what it contains and where it lands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Archive to extract into the target root
    pub archive: PathBuf,
    /// Subdirectory of the target holding this package's entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "entry")]
    pub entries: Vec<Entry>,
}

impl Package {
    pub fn new(archive: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Self {
            archive: archive.into(),
            directory: None,
            description: description.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_file(mut self, name: impl Into<String>) -> Self {
        self.entries.push(Entry::file(name));
        self
    }

    pub fn with_dir(mut self, name: impl Into<String>) -> Self {
        self.entries.push(Entry::directory(name));
        self
    }

    /// The subdirectory entries live under, `None` when they sit in the target root
    pub fn effective_directory(&self) -> Option<&str> {
        self.directory.as_deref().filter(|d| !d.is_empty())
    }

    /// Name for logs and plan listings: the description, or the archive path
    /// when there is none
    ///
    /// Install status lines use `description` verbatim instead.
    pub fn label(&self) -> String {
        if self.description.is_empty() {
            self.archive.display().to_string()
        } else {
            self.description.clone()
        }
    }
}

/// Ordered list of packages to install
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "package")]
    pub packages: Vec<Package>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Load a manifest file; relative archive paths resolve against its directory
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io_at("Failed to read manifest", path, e))?;
        let mut manifest = Self::parse(&content)?;
        if let Some(base) = path.parent() {
            manifest.resolve_archives(base);
        }
        Ok(manifest)
    }

    /// Parse and validate a TOML manifest
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest =
            toml::from_str(content).map_err(|e| Error::Manifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Rebase relative archive paths onto `base`
    pub fn resolve_archives(&mut self, base: &Path) {
        for package in &mut self.packages {
            if package.archive.is_relative() {
                package.archive = base.join(&package.archive);
            }
        }
    }

    /// Check names are usable as relative paths
    ///
    /// Duplicate entry names inside one package are tolerated but logged.
    pub fn validate(&self) -> Result<()> {
        for (index, package) in self.packages.iter().enumerate() {
            if package.archive.as_os_str().is_empty() {
                return Err(Error::Manifest(format!(
                    "package #{} has an empty archive path",
                    index + 1
                )));
            }

            if let Some(dir) = package.effective_directory() {
                relative_path(dir).map_err(|e| {
                    Error::Manifest(format!("package #{} directory: {}", index + 1, e))
                })?;
            }

            let mut seen = HashSet::new();
            for entry in &package.entries {
                relative_path(&entry.name).map_err(|e| {
                    Error::Manifest(format!("package #{} entry: {}", index + 1, e))
                })?;
                if !seen.insert(entry.name.as_str()) {
                    warn!(
                        "Duplicate entry '{}' in package {}",
                        entry.name,
                        package.label()
                    );
                }
            }
        }
        Ok(())
    }
}
