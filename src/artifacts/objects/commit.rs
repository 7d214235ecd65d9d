//! Git commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! They contain:
//! - A tree object ID (directory snapshot)
//! - An optional parent commit ID (absent for the root commit)
//! - Author information
//! - Commit message
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use chrono::Timelike;
use std::io::BufRead;

/// Regex pattern for "name <email> timestamp timezone"
const AUTHOR_REGEX: &str = r"^(.*?)\s+<([^>]*)>\s+(-?\d+)\s+([+-]\d{4})$";

/// Author information: name, email, and timestamp with timezone
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Create a new author with the current local time, truncated to whole seconds
    pub fn new(name: String, email: String) -> Self {
        let now = chrono::Local::now().fixed_offset();
        let timestamp = now.with_nanosecond(0).unwrap_or(now);

        Author {
            name,
            email,
            timestamp,
        }
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// "Name <email@example.com>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// "Name <email> timestamp timezone", as written in the commit body
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Load author information from environment variables
    ///
    /// Reads GIT_AUTHOR_NAME, GIT_AUTHOR_EMAIL, and optionally GIT_AUTHOR_DATE.
    /// If no date is provided, uses current time.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name = std::env::var("GIT_AUTHOR_NAME").context("GIT_AUTHOR_NAME not set")?;
        let email = std::env::var("GIT_AUTHOR_EMAIL").context("GIT_AUTHOR_EMAIL not set")?;
        let timestamp = std::env::var("GIT_AUTHOR_DATE").ok().and_then(|date_str| {
            chrono::DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| chrono::DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        });

        match timestamp {
            Some(ts) => Ok(Author::new_with_timestamp(name, email, ts)),
            None => Ok(Author::new(name, email)),
        }
    }

    /// "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }

    fn epoch() -> chrono::DateTime<chrono::FixedOffset> {
        chrono::DateTime::UNIX_EPOCH.fixed_offset()
    }

    fn parse_timestamp(
        seconds: &str,
        timezone: &str,
    ) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        let seconds = seconds.parse::<i64>().ok()?;
        let offset = timezone.parse::<i32>().ok()?;
        let offset_seconds = (offset / 100) * 3600 + (offset % 100) * 60;
        let offset = chrono::FixedOffset::east_opt(offset_seconds)?;

        Some(chrono::DateTime::from_timestamp(seconds, 0)?.with_timezone(&offset))
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    /// Parses "name <email> timestamp timezone"; anything else is kept whole as the name
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parsed = regex::Regex::new(AUTHOR_REGEX)?
            .captures(value)
            .and_then(|captures| {
                let timestamp = Self::parse_timestamp(&captures[3], &captures[4])?;
                Some(Author {
                    name: captures[1].trim().to_string(),
                    email: captures[2].to_string(),
                    timestamp,
                })
            });

        Ok(parsed.unwrap_or_else(|| Author {
            name: value.to_string(),
            email: String::new(),
            timestamp: Self::epoch(),
        }))
    }
}

/// Git commit object
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit ID (None for the root commit)
    parent: Option<ObjectId>,
    /// Tree object ID representing the directory snapshot
    tree_oid: ObjectId,
    /// Author who wrote the changes
    author: Author,
    /// Commit message
    message: String,
}

impl Commit {
    pub fn new(
        parent: Option<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            parent,
            tree_oid,
            author,
            message,
        }
    }

    /// First line of the commit message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(Bytes::from(self.display()))
    }
}

impl Unpackable for Commit {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .context("Invalid commit object: body is not UTF-8")?;

        let (headers, message) = match content.split_once("\n\n") {
            Some((headers, message)) => (headers, message),
            None => (content.trim_end_matches('\n'), ""),
        };

        let mut tree_oid = None;
        let mut parent = None;
        let mut author = None;

        for line in headers.split('\n') {
            let (key, value) = line.split_once(' ').unwrap_or((line, ""));
            match key {
                "tree" => tree_oid = Some(ObjectId::try_parse(value.to_string())?),
                "parent" => parent = Some(ObjectId::try_parse(value.to_string())?),
                "author" => author = Some(Author::try_from(value)?),
                _ => {}
            }
        }

        let tree_oid = tree_oid.context("Invalid commit object: missing tree line")?;
        let author = author.context("Invalid commit object: missing author line")?;

        Ok(Self::new(parent, tree_oid, author, message.to_string()))
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }
}

impl Commit {
    /// The commit body: headers, a blank line, then the message
    pub fn display(&self) -> String {
        let mut lines = vec![];

        lines.push(format!("tree {}", self.tree_oid));
        if let Some(parent) = &self.parent {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn author() -> Author {
        let timestamp =
            chrono::DateTime::parse_from_str("2023-01-01 12:00:00 +0900", "%Y-%m-%d %H:%M:%S %z")
                .unwrap();
        Author::new_with_timestamp("Jane Doe".to_string(), "jane@example.com".to_string(), timestamp)
    }

    #[fixture]
    fn tree_oid() -> ObjectId {
        ObjectId::try_parse("4b825dc642cb6eb9a060e54bf8d69288fbee4904".to_string()).unwrap()
    }

    #[test]
    fn current_author_survives_a_round_trip() {
        let author = Author::new("Jane Doe".to_string(), "jane@example.com".to_string());

        assert_eq!(author.timestamp().nanosecond(), 0);
        assert_eq!(Author::try_from(author.display().as_str()).unwrap(), author);
    }

    #[rstest]
    fn root_commit_body(author: Author, tree_oid: ObjectId) {
        let commit = Commit::new(None, tree_oid, author, "first".to_string());

        assert_eq!(
            commit.display(),
            "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
             author Jane Doe <jane@example.com> 1672542000 +0900\n\
             \n\
             first"
        );
    }

    #[rstest]
    fn parent_line_follows_tree(author: Author, tree_oid: ObjectId) {
        let parent = Some(tree_oid.clone());
        let commit = Commit::new(parent, tree_oid, author, "second".to_string());

        let body = commit.display();
        let lines = body.lines().collect::<Vec<_>>();
        assert!(lines[0].starts_with("tree "));
        assert!(lines[1].starts_with("parent "));
        assert!(lines[2].starts_with("author "));
    }

    #[rstest]
    fn commit_parses_back(author: Author, tree_oid: ObjectId) {
        let commit = Commit::new(
            Some(tree_oid.clone()),
            tree_oid,
            author,
            "subject\n\nbody with\n\nblank lines\n".to_string(),
        );

        let payload = commit.serialize().unwrap();
        let parsed = Commit::deserialize(payload.as_ref()).unwrap();

        assert_eq!(parsed, commit);
        assert_eq!(parsed.message(), "subject\n\nbody with\n\nblank lines\n");
        assert_eq!(parsed.short_message(), "subject");
    }

    #[test]
    fn unknown_headers_are_ignored() {
        let body = "tree 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
                    author A <a@b.c> 0 +0000\n\
                    committer A <a@b.c> 0 +0000\n\
                    gpgsig xyz\n\
                    \n\
                    message";

        let commit = Commit::deserialize(body.as_bytes()).unwrap();

        assert_eq!(commit.author().name(), "A");
        assert_eq!(commit.message(), "message");
        assert!(commit.is_root());
    }

    #[test]
    fn missing_tree_is_rejected() {
        let body = "author A <a@b.c> 0 +0000\n\nmessage";
        assert!(Commit::deserialize(body.as_bytes()).is_err());
    }

    #[rstest]
    #[case("Jane Doe <jane@example.com> 1672542000 +0900", "Jane Doe", "jane@example.com", 1672542000)]
    #[case("solo <s@x> 5 -0130", "solo", "s@x", 5)]
    fn author_line_is_split(
        #[case] raw: &str,
        #[case] name: &str,
        #[case] email: &str,
        #[case] seconds: i64,
    ) {
        let author = Author::try_from(raw).unwrap();

        assert_eq!(author.name(), name);
        assert_eq!(author.email(), email);
        assert_eq!(author.timestamp().timestamp(), seconds);
        assert_eq!(author.display(), raw);
    }

    #[test]
    fn unmatched_author_keeps_raw_value() {
        let author = Author::try_from("just a name").unwrap();

        assert_eq!(author.name(), "just a name");
        assert_eq!(author.email(), "");
    }
}
