use crate::areas::layout::DEFAULT_BRANCH;
use crate::areas::repository::Repository;
use anyhow::Context;
use std::fs;
use std::io::Write;
use tracing::info;

impl Repository {
    /// Create the metadata directory; an existing HEAD and index are left untouched
    pub async fn init(&mut self) -> anyhow::Result<()> {
        fs::create_dir_all(self.database().objects_path())
            .context("Failed to create .git/objects directory")?;

        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .git/refs/heads directory")?;

        if !self.refs().head_path().exists() {
            self.refs()
                .set_head_to_branch(DEFAULT_BRANCH)
                .context("Failed to create initial HEAD reference")?;
        }

        let index = self.index();
        let index = index.lock().await;
        if !index.path().exists() {
            fs::write(index.path(), b"").context("Failed to create .git/index file")?;
        }

        info!(path = %self.path().display(), "initialized repository");
        writeln!(
            self.writer(),
            "Initialized empty Git repository in {}",
            self.layout().git_path().display()
        )?;

        Ok(())
    }
}
