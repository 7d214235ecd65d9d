//! HEAD and branch references
//!
//! HEAD is either symbolic (`ref: refs/heads/main`) or holds a commit ID directly.
//! Branch files under `refs/heads` hold the 40-character ID of the branch tip, written
//! without a trailing newline.

use crate::areas::write_file_atomically;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

/// Prefix of branch references, relative to the metadata directory
pub const HEADS_PREFIX: &str = "refs/heads/";

/// Symbolic references are followed at most this many times
const MAX_SYMREF_DEPTH: usize = 5;

/// Reference manager rooted at the metadata directory (typically `.git`)
#[derive(Debug, new)]
pub struct Refs {
    path: Box<Path>,
}

/// Content of a reference file
#[derive(Debug, Clone, PartialEq, Eq)]
enum SymRefOrOid {
    /// `ref: <path>`, the path being relative to the metadata directory
    SymRef(String),
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read ref file {}", path.display()))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        match regex::Regex::new(SYMREF_REGEX)?.captures(content) {
            Some(symref_match) => Ok(Some(SymRefOrOid::SymRef(symref_match[1].to_string()))),
            None => Ok(Some(SymRefOrOid::Oid(
                ObjectId::try_parse(content.to_string())
                    .with_context(|| format!("Invalid ref file {}", path.display()))?,
            ))),
        }
    }
}

impl Refs {
    pub fn head_path(&self) -> PathBuf {
        self.path.join(HEAD_REF_NAME)
    }

    pub fn heads_path(&self) -> PathBuf {
        self.path.join(HEADS_PREFIX)
    }

    /// Commit ID HEAD resolves to
    ///
    /// A missing HEAD, or a symbolic HEAD naming a branch without commits, yields `None`.
    pub fn read_head(&self) -> anyhow::Result<Option<ObjectId>> {
        let target = self.resolve_symref_path(&self.head_path())?;

        match SymRefOrOid::read_symref_or_oid(&target)? {
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            Some(SymRefOrOid::SymRef(_)) | None => Ok(None),
        }
    }

    /// Point the current branch at `oid`
    ///
    /// A symbolic HEAD updates the branch file it names; otherwise HEAD itself is overwritten.
    pub fn update_head(&self, oid: &ObjectId) -> anyhow::Result<()> {
        let target = self.resolve_symref_path(&self.head_path())?;

        write_file_atomically(&target, oid.as_ref().as_bytes())?;
        info!(target = %target.display(), %oid, "updated ref");

        Ok(())
    }

    /// Make HEAD a symbolic reference to `refs/heads/<branch>`
    pub fn set_head_to_branch(&self, branch: &str) -> anyhow::Result<()> {
        let content = format!("ref: {HEADS_PREFIX}{branch}\n");
        write_file_atomically(&self.head_path(), content.as_bytes())?;
        debug!(branch, "HEAD set to branch");

        Ok(())
    }

    /// Name of the branch HEAD points at, `None` when HEAD is detached or missing
    pub fn current_branch(&self) -> anyhow::Result<Option<String>> {
        match SymRefOrOid::read_symref_or_oid(&self.head_path())? {
            Some(SymRefOrOid::SymRef(target)) => Ok(Some(
                target
                    .strip_prefix(HEADS_PREFIX)
                    .unwrap_or(&target)
                    .to_string(),
            )),
            Some(SymRefOrOid::Oid(_)) | None => Ok(None),
        }
    }

    /// Follow symbolic references from `path` to the file that holds (or will hold) an ID
    fn resolve_symref_path(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let mut current = path.to_path_buf();

        for _ in 0..MAX_SYMREF_DEPTH {
            match SymRefOrOid::read_symref_or_oid(&current)? {
                Some(SymRefOrOid::SymRef(target)) => current = self.ref_path(&target)?,
                Some(SymRefOrOid::Oid(_)) | None => return Ok(current),
            }
        }

        anyhow::bail!(
            "Too many levels of symbolic references starting at {}",
            path.display()
        )
    }

    /// Resolve a symbolic reference target inside the metadata directory
    fn ref_path(&self, target: &str) -> anyhow::Result<PathBuf> {
        let target_path = Path::new(target);
        let stays_inside = target_path
            .components()
            .all(|component| matches!(component, Component::Normal(_)));

        if !stays_inside {
            anyhow::bail!("Symbolic reference '{target}' points outside the repository");
        }

        Ok(self.path.join(target_path))
    }
}
