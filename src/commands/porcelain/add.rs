use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Files touched by an `add`, as repository-relative paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    /// Files whose entry was created or replaced
    pub staged: Vec<String>,
    /// Files already staged with identical content
    pub unchanged: Vec<String>,
}

impl AddReport {
    pub fn is_noop(&self) -> bool {
        self.staged.is_empty()
    }
}

impl Repository {
    /// Stage files and directories, the latter expanded recursively
    ///
    /// Every target is resolved before anything is written, so a missing or invalid path
    /// leaves the object database and the index untouched.
    pub async fn add(&mut self, paths: &[String]) -> anyhow::Result<AddReport> {
        self.ensure_initialized()?;

        let mut files = BTreeSet::new();
        for path in paths {
            let relative = self.workspace().resolve(Path::new(path))?;
            files.extend(self.workspace().list_files(&relative)?);
        }

        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let mut report = AddReport::default();
        for file in files {
            let blob = self.workspace().parse_blob(&file)?;
            let blob_id = self.database().hash_only(&blob)?;

            if index.contains_unchanged(&file, &blob_id) {
                debug!(path = %file, "unchanged, skipping");
                report.unchanged.push(file);
                continue;
            }

            let stat = self.workspace().stat_file(&file)?;
            self.database().store(&blob)?;
            index.add(IndexEntry::new(file.clone(), blob_id, stat));
            report.staged.push(file);
        }

        if report.is_noop() {
            writeln!(self.writer(), "Nothing has changed.")?;
            return Ok(report);
        }

        index.write_updates()?;
        info!(
            staged = report.staged.len(),
            unchanged = report.unchanged.len(),
            "updated index"
        );

        Ok(report)
    }
}
