//! Git index (staging area)
//!
//! The index records which files go into the next commit, together with the blob ID and
//! the filesystem metadata captured when each file was staged.
//!
//! ## Index File Format
//!
//! The index file contains:
//! - Header: Signature, version, and entry count
//! - Entries: Sorted list of staged files with metadata
//! - Checksum: SHA-1 hash of header and entries, verified on load
//!
//! ## Data Structures
//!
//! - `entries`: Maps file paths to their index entries, ordered by path bytes
//! - `children`: Maps directory paths to the staged files beneath them, used to discard
//!   entries that would turn a staged file into a directory or the other way round

use crate::areas::write_file_atomically;
use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{ENTRY_FIXED_SIZE, IndexEntry};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;
use anyhow::Context;
use byteorder::ByteOrder;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::debug;

/// Git index (staging area)
///
/// Loaded once per command, mutated in memory and written back as a whole.
#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (typically `.git/index`)
    path: Box<Path>,
    /// Staged files mapped by path
    entries: BTreeMap<String, IndexEntry>,
    /// Directory hierarchy for parent-child lookups
    children: BTreeMap<String, BTreeSet<String>>,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry_by_path(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
    }

    /// Load the index from disk
    ///
    /// A missing or zero-length file yields an empty index.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no index file, starting empty");
            self.clear();
            return Ok(());
        }

        let content = std::fs::read(&self.path)
            .with_context(|| format!("Unable to read index file {}", self.path.display()))?;
        self.load_from_bytes(&content)?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "loaded index");
        Ok(())
    }

    /// Replace the in-memory state with the entries encoded in `content`
    pub fn load_from_bytes(&mut self, content: &[u8]) -> anyhow::Result<()> {
        self.clear();

        if content.is_empty() {
            return Ok(());
        }

        let mut reader = Checksum::new(Cursor::new(content));
        let entries_count = Self::parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;

        reader.verify()
    }

    fn parse_header<R: Read>(reader: &mut Checksum<R>) -> anyhow::Result<u32> {
        let header_bytes = reader.read(HEADER_SIZE)?;
        let header = IndexHeader::deserialize(header_bytes.as_ref())?;

        if header.marker != SIGNATURE {
            return Err(RepositoryError::index_corrupt(format!(
                "invalid signature {:?}",
                header.marker
            ))
            .into());
        }

        if header.version != VERSION {
            return Err(RepositoryError::index_corrupt(format!(
                "unsupported version {}",
                header.version
            ))
            .into());
        }

        Ok(header.entries_count)
    }

    /// Each entry is located from the previous one's padded length
    fn parse_entries<R: Read>(
        &mut self,
        entries_count: u32,
        reader: &mut Checksum<R>,
    ) -> anyhow::Result<()> {
        for _ in 0..entries_count {
            let fixed = reader.read(ENTRY_FIXED_SIZE)?;
            let path_length =
                byteorder::NetworkEndian::read_u16(&fixed[ENTRY_FIXED_SIZE - 2..]) as usize;
            let rest = reader.read(IndexEntry::padded_size(path_length) - ENTRY_FIXED_SIZE)?;

            let entry_bytes = [fixed.as_ref(), rest.as_ref()].concat();
            let entry = IndexEntry::deserialize(entry_bytes.as_slice())?;

            if self.entries.contains_key(&entry.name) {
                return Err(RepositoryError::index_corrupt(format!(
                    "duplicate entry for '{}'",
                    entry.name
                ))
                .into());
            }

            self.store_entry(entry);
        }

        Ok(())
    }

    /// Drop entries that clash with `entry`: staged files where its parent directories
    /// would go, and staged files below it if it used to be a directory
    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_string())
                .or_default()
                .insert(entry.name.clone());
        }

        self.entries.insert(entry.name.clone(), entry);
    }

    fn remove_children(&mut self, path: &str) {
        if let Some(children) = self.children.remove(path) {
            for child in children {
                self.remove_entry(&child);
            }
        }
    }

    fn remove_entry(&mut self, path: &str) {
        if let Some(entry) = self.entries.remove(path) {
            for parent in entry.parent_dirs() {
                if let Some(children) = self.children.get_mut(parent) {
                    children.remove(path);
                    if children.is_empty() {
                        self.children.remove(parent);
                    }
                }
            }
        }
    }

    /// Insert or replace the entry for `entry.name`
    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);
    }

    /// True only if `path` is staged with exactly this blob ID
    pub fn contains_unchanged(&self, path: &str, oid: &ObjectId) -> bool {
        self.entries
            .get(path)
            .is_some_and(|entry| &entry.oid == oid)
    }

    pub fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut writer = Checksum::new(Vec::new());

        let header = IndexHeader {
            entries_count: u32::try_from(self.entries.len())
                .context("Too many index entries")?,
            ..IndexHeader::empty()
        };
        writer.write(&header.serialize()?)?;

        for entry in self.entries() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?;

        Ok(Bytes::from(writer.into_inner()))
    }

    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let content = self.serialize()?;
        write_file_atomically(&self.path, &content)?;

        debug!(path = %self.path.display(), entries = self.entries.len(), "wrote index");
        Ok(())
    }

    /// Entries in path byte order
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// `(path, blob id)` pairs in path byte order, as consumed by the tree builder
    pub fn blob_entries(&self) -> impl Iterator<Item = (&str, &ObjectId)> {
        self.entries
            .values()
            .map(|entry| (entry.name.as_str(), &entry.oid))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
