//! Git tree object
//!
//! Trees represent directory snapshots. They contain entries for files (blobs)
//! and subdirectories (other trees), along with their names and modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`, entries sorted by name byte-wise.
//!
//! ## Tree Building
//!
//! [`TreeBuilder`] turns the flat `(path, blob id)` list of the index into nested
//! directory nodes, then hashes every directory children-first. Since entries are
//! kept sorted by name, the resulting IDs depend only on content, never on the order
//! paths were staged in.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::RepositoryError;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// A single named child of a tree
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct TreeEntry {
    pub name: String,
    pub oid: ObjectId,
    pub mode: EntryMode,
}

impl TreeEntry {
    pub fn object_type(&self) -> ObjectType {
        match self.mode.is_tree() {
            true => ObjectType::Tree,
            false => ObjectType::Blob,
        }
    }
}

/// Git tree object representing a directory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    pub fn new(entries: impl IntoIterator<Item = TreeEntry>) -> Self {
        Tree {
            entries: entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
        }
    }

    /// Entries in canonical (byte-wise name) order
    pub fn entries(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();

        for entry in self.entries() {
            let header = format!("{} {}", entry.mode.as_str(), entry.name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            entry.oid.write_h40_to(&mut content_bytes)?;
        }

        Ok(Bytes::from(content_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = Vec::new();

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }
            let mode = EntryMode::from_octal_str(std::str::from_utf8(&mode_bytes)?)?;

            // Read "name\0"
            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }
            let name = std::str::from_utf8(&name_bytes)?.to_owned();

            let oid =
                ObjectId::read_h40_from(&mut reader).context("unexpected EOF in object id")?;

            entries.push(TreeEntry::new(name, oid, mode));
        }

        Ok(Tree::new(entries))
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }
}

/// Node of the in-memory directory hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
enum TreeNode {
    /// Staged file holding its blob ID
    Leaf(ObjectId),
    /// Directory keyed by child name
    Directory(BTreeMap<String, TreeNode>),
}

/// Tree IDs computed by [`TreeBuilder::traverse`], keyed by directory path (`""` is the root)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeHashes {
    root: ObjectId,
    by_path: BTreeMap<String, ObjectId>,
}

impl TreeHashes {
    pub fn root(&self) -> &ObjectId {
        &self.root
    }

    pub fn get(&self, dir_path: &str) -> Option<&ObjectId> {
        self.by_path.get(dir_path)
    }

    /// Number of tree objects, root included
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

/// Builds nested trees out of flat `/`-separated paths
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    root: BTreeMap<String, TreeNode>,
}

impl TreeBuilder {
    pub fn build<'e>(
        entries: impl IntoIterator<Item = (&'e str, &'e ObjectId)>,
    ) -> anyhow::Result<Self> {
        let mut builder = Self::default();

        for (path, oid) in entries {
            let components = path.split('/').collect::<Vec<_>>();
            if components.iter().any(|component| component.is_empty()) {
                return Err(RepositoryError::invalid_path(path, "empty path component").into());
            }

            Self::insert(&mut builder.root, path, &components, oid)?;
        }

        Ok(builder)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    fn insert(
        nodes: &mut BTreeMap<String, TreeNode>,
        path: &str,
        components: &[&str],
        oid: &ObjectId,
    ) -> anyhow::Result<()> {
        match components {
            [name] => {
                if let Some(TreeNode::Directory(_)) = nodes.get(*name) {
                    return Err(RepositoryError::invalid_path(
                        path,
                        "staged both as a file and as a directory",
                    )
                    .into());
                }
                nodes.insert(name.to_string(), TreeNode::Leaf(oid.clone()));

                Ok(())
            }
            [dir, rest @ ..] => {
                let node = nodes
                    .entry(dir.to_string())
                    .or_insert_with(|| TreeNode::Directory(BTreeMap::new()));

                match node {
                    TreeNode::Directory(children) => Self::insert(children, path, rest, oid),
                    TreeNode::Leaf(_) => Err(RepositoryError::invalid_path(
                        path,
                        format!("parent '{dir}' is staged as a file"),
                    )
                    .into()),
                }
            }
            [] => Err(RepositoryError::invalid_path(path, "empty path").into()),
        }
    }

    /// Hash every directory children-first, handing each tree to `func` before its parent
    ///
    /// Returns `None` when nothing was staged.
    pub fn traverse<F>(&self, func: &mut F) -> anyhow::Result<Option<TreeHashes>>
    where
        F: FnMut(&str, &Tree) -> anyhow::Result<()>,
    {
        if self.is_empty() {
            return Ok(None);
        }

        let mut by_path = BTreeMap::new();
        let root = Self::hash_directory("", &self.root, func, &mut by_path)?;

        Ok(Some(TreeHashes { root, by_path }))
    }

    fn hash_directory<F>(
        dir_path: &str,
        children: &BTreeMap<String, TreeNode>,
        func: &mut F,
        by_path: &mut BTreeMap<String, ObjectId>,
    ) -> anyhow::Result<ObjectId>
    where
        F: FnMut(&str, &Tree) -> anyhow::Result<()>,
    {
        let mut entries = Vec::with_capacity(children.len());

        for (name, node) in children {
            match node {
                TreeNode::Leaf(oid) => entries.push(TreeEntry::new(
                    name.clone(),
                    oid.clone(),
                    EntryMode::File(FileMode::Regular),
                )),
                TreeNode::Directory(grandchildren) => {
                    let sub_path = match dir_path {
                        "" => name.clone(),
                        _ => format!("{dir_path}/{name}"),
                    };
                    let oid = Self::hash_directory(&sub_path, grandchildren, func, by_path)?;
                    entries.push(TreeEntry::new(name.clone(), oid, EntryMode::Directory));
                }
            }
        }

        let tree = Tree::new(entries);
        func(dir_path, &tree)?;

        let oid = tree.object_id()?;
        by_path.insert(dir_path.to_string(), oid.clone());

        Ok(oid)
    }
}
