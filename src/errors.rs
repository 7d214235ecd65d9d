use crate::artifacts::objects::object_id::ObjectId;
use std::path::PathBuf;

/// Failures the storage engine reports to its callers.
///
/// Raised through `anyhow`; recover the variant with `downcast_ref::<RepositoryError>()`.
/// "Nothing to commit" and "no history yet" are not errors, see
/// [`CommitOutcome`](crate::commands::porcelain::commit::CommitOutcome) and
/// [`LogOutcome`](crate::commands::porcelain::log::LogOutcome).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The target of an `add` does not exist in the working directory.
    #[error("pathspec '{}' did not match any files", .0.display())]
    PathNotFound(PathBuf),

    /// The path cannot be stored in the index or in a tree.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The digest has no backing object file.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The staging index bytes do not follow the index file layout.
    #[error("index file corrupt: {0}")]
    IndexCorrupt(String),
}

impl RepositoryError {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        RepositoryError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn index_corrupt(reason: impl Into<String>) -> Self {
        RepositoryError::IndexCorrupt(reason.into())
    }
}
