//! Core repository components
//!
//! - `database`: Object database for storing blobs, trees, and commits
//! - `index`: Staging area for tracking what goes into the next commit
//! - `layout`: Locations of the repository files, derived from the working tree root
//! - `refs`: HEAD and branch references
//! - `repository`: High-level repository operations and coordination
//! - `workspace`: Working directory file system operations

pub mod database;
pub mod index;
pub mod layout;
pub mod refs;
pub mod repository;
pub mod workspace;

use anyhow::Context;
use std::io::Write;
use std::path::Path;

/// Write `data` next to `path` under a temporary name, then rename it into place
pub(crate) fn write_file_atomically(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("Invalid file path {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Unable to create directory {}", dir.display()))?;

    let temp_path = dir.join(format!("tmp-{}", fake::rand::random::<u32>()));

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .with_context(|| format!("Unable to open file {}", temp_path.display()))?;

    file.write_all(data)
        .with_context(|| format!("Unable to write file {}", temp_path.display()))?;
    drop(file);

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Unable to rename file to {}", path.display()))?;

    Ok(())
}
