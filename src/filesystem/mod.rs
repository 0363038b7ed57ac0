// src/filesystem/mod.rs

//! Filesystem helpers for the installer
//!
//! This module provides:
//! - Validation of manifest-supplied relative paths
//! - Rename-style moves for files and directory trees, with a copy fallback
//!   when source and destination sit on different filesystems

pub mod mover;
pub mod path;

pub use mover::{is_dir_empty, move_dir, move_file};
pub use path::{relative_path, safe_join};
