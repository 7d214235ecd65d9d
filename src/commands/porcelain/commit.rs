use crate::areas::repository::Repository;
use crate::artifacts::objects::commit::{Author, Commit};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use std::io::Write;
use tracing::info;

/// Result of a commit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was written and HEAD now points at it
    Created { oid: ObjectId, root: bool },
    /// The index is empty; nothing was written
    NothingToCommit,
}

impl Repository {
    /// Commit the staged files, taking the author from the environment
    ///
    /// The author is only required once there is something to commit.
    pub async fn commit(&mut self, message: &str) -> anyhow::Result<CommitOutcome> {
        self.commit_staged(message, Author::load_from_env).await
    }

    pub async fn commit_with_author(
        &mut self,
        message: &str,
        author: Author,
    ) -> anyhow::Result<CommitOutcome> {
        self.commit_staged(message, || Ok(author)).await
    }

    async fn commit_staged(
        &mut self,
        message: &str,
        author: impl FnOnce() -> anyhow::Result<Author>,
    ) -> anyhow::Result<CommitOutcome> {
        self.ensure_initialized()?;

        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        if index.is_empty() {
            writeln!(self.writer(), "nothing to commit")?;
            return Ok(CommitOutcome::NothingToCommit);
        }
        let author = author()?;

        let trees = self
            .write_tree(&index)?
            .context("Staged files produced no root tree")?;

        let parent = self.refs().read_head()?;
        let root = parent.is_none();

        let commit = Commit::new(
            parent,
            trees.root().clone(),
            author,
            message.to_string(),
        );
        let commit_id = self.database().store(&commit)?.into_oid();
        self.refs().update_head(&commit_id)?;
        info!(oid = %commit_id, trees = trees.len(), root, "created commit");

        let branch = self
            .refs()
            .current_branch()?
            .unwrap_or_else(|| "detached HEAD".to_string());
        writeln!(
            self.writer(),
            "[{}{} {}] {}",
            branch,
            if root { " (root-commit)" } else { "" },
            commit_id.to_short_oid(),
            commit.short_message()
        )?;

        Ok(CommitOutcome::Created {
            oid: commit_id,
            root,
        })
    }
}
