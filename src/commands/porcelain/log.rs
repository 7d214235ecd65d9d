use crate::areas::repository::Repository;
use crate::artifacts::log::LogEntry;
use colored::Colorize;
use std::io::Write;

/// Result of a log request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    /// Number of commits printed
    Shown(usize),
    /// HEAD does not resolve to a commit yet
    NoCommits,
}

impl Repository {
    /// Print the history reachable from HEAD in medium format, newest first
    pub async fn log(&mut self) -> anyhow::Result<LogOutcome> {
        self.ensure_initialized()?;

        let history = self.history()?;
        if history.is_empty() {
            writeln!(self.writer(), "there is no commit.")?;
            return Ok(LogOutcome::NoCommits);
        }

        for (position, entry) in history.iter().enumerate() {
            if position > 0 {
                writeln!(self.writer())?;
            }
            self.show_commit_medium(entry)?;
        }

        Ok(LogOutcome::Shown(history.len()))
    }

    fn show_commit_medium(&self, entry: &LogEntry) -> anyhow::Result<()> {
        let commit = &entry.commit;

        writeln!(self.writer(), "{}", format!("commit {}", entry.oid).yellow())?;
        writeln!(self.writer(), "Author: {}", commit.author().display_name())?;
        writeln!(
            self.writer(),
            "Date:   {}",
            commit.author().readable_timestamp()
        )?;
        writeln!(self.writer())?;
        for message_line in commit.message().lines() {
            writeln!(self.writer(), "    {message_line}")?;
        }

        Ok(())
    }
}
