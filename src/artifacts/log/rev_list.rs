use crate::areas::database::Database;
use crate::artifacts::log::LogEntry;
use crate::artifacts::objects::object_id::ObjectId;
use std::collections::HashSet;
use tracing::debug;

/// Iterator over a commit chain, newest to oldest
///
/// Yields an error and stops when a link cannot be loaded, is not a commit, or was
/// already visited.
pub struct RevList<'r> {
    database: &'r Database,
    next: Option<ObjectId>,
    visited: HashSet<ObjectId>,
}

impl<'r> RevList<'r> {
    pub fn new(database: &'r Database, start: Option<ObjectId>) -> Self {
        RevList {
            database,
            next: start,
            visited: HashSet::new(),
        }
    }

    fn load(&mut self, oid: ObjectId) -> anyhow::Result<LogEntry> {
        if !self.visited.insert(oid.clone()) {
            anyhow::bail!("Commit history loops back to {oid}");
        }

        let commit = self
            .database
            .parse_object_as_commit(&oid)?
            .ok_or_else(|| anyhow::anyhow!("Object {oid} is not a commit"))?;
        debug!(%oid, parent = ?commit.parent(), "walked commit");

        self.next = commit.parent().cloned();
        Ok(LogEntry::new(oid, commit))
    }
}

impl Iterator for RevList<'_> {
    type Item = anyhow::Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = self.next.take()?;

        Some(self.load(oid))
    }
}
