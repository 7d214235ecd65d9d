//! Index entry representation
//!
//! Each entry in the index represents a staged file with:
//! - File path (relative to the repository root, `/`-separated, UTF-8)
//! - Content hash (object ID of the blob)
//! - File metadata (mode, size, timestamps, device and inode)
//!
//! ## Entry Format
//!
//! ```text
//! ctime  ctime_nsec  mtime  mtime_nsec  dev  ino  mode  uid  gid  size   (10 x u32)
//! object id                                                            (20 bytes)
//! path length                                                          (u16)
//! path                                                                 (path length bytes)
//! NUL padding                                                          (1..=8 bytes)
//! ```
//!
//! The padding brings the entry to a multiple of 8 bytes. Entries follow the 12-byte header
//! back to back, so alignment is measured from the start of the entries region.

use crate::artifacts::index::entry_mode::{EntryMode, FileMode};
use crate::artifacts::objects::OBJECT_ID_BYTES;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::RepositoryError;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use is_executable::IsExecutable;
use std::fs::Metadata;
use std::io::{BufRead, Write};
use std::os::unix::prelude::MetadataExt;
use std::path::Path;

/// Maximum path length representable by the 16-bit length field
pub const MAX_PATH_SIZE: usize = u16::MAX as usize;

/// Block size for entry alignment (8 bytes)
pub const ENTRY_BLOCK: usize = 8;

/// Size of the stat fields in bytes (10 x u32)
pub const STAT_SIZE: usize = 40;

/// Size of an entry before its path: stat fields, object ID and path length
pub const ENTRY_FIXED_SIZE: usize = STAT_SIZE + OBJECT_ID_BYTES + 2;

/// Index entry representing a staged file
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// File path relative to repository root
    pub name: String,
    /// SHA-1 hash of file content
    pub oid: ObjectId,
    /// File metadata (mode, size, timestamps)
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    /// Total on-disk size of an entry whose path is `path_length` bytes long
    ///
    /// At least one NUL byte always follows the path.
    pub fn padded_size(path_length: usize) -> usize {
        let unpadded = ENTRY_FIXED_SIZE + path_length;
        (unpadded / ENTRY_BLOCK + 1) * ENTRY_BLOCK
    }

    /// Byte length of the UTF-8 path, as stored in the length field
    pub fn path_length(&self) -> anyhow::Result<u16> {
        u16::try_from(self.name.len()).map_err(|_| {
            RepositoryError::invalid_path(
                self.name.clone(),
                format!("longer than {MAX_PATH_SIZE} bytes"),
            )
            .into()
        })
    }

    /// Ancestor directories from the outermost inwards: `a/b/c` yields `a`, `a/b`
    pub fn parent_dirs(&self) -> Vec<&str> {
        self.name
            .match_indices('/')
            .map(|(position, _)| &self.name[..position])
            .collect()
    }
}

impl PartialOrd for IndexEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .as_bytes()
            .cmp(other.name.as_bytes())
            .then_with(|| self.oid.cmp(&other.oid))
            .then_with(|| self.metadata.cmp(&other.metadata))
    }
}

/// File metadata stored in index entries
///
/// Every field occupies 32 bits on disk; wider values are truncated when captured.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntryMetadata {
    /// Change time (seconds since Unix epoch)
    pub ctime: u32,
    /// Change time nanoseconds
    pub ctime_nsec: u32,
    /// Modification time (seconds since Unix epoch)
    pub mtime: u32,
    /// Modification time nanoseconds
    pub mtime_nsec: u32,
    /// Device ID
    pub dev: u32,
    /// Inode number
    pub ino: u32,
    /// File mode
    pub mode: u32,
    /// User ID of owner
    pub uid: u32,
    /// Group ID of owner
    pub gid: u32,
    /// File size in bytes
    pub size: u32,
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let path_length = self.path_length()?;
        let mut entry_bytes = Vec::with_capacity(Self::padded_size(self.name.len()));

        for field in [
            self.metadata.ctime,
            self.metadata.ctime_nsec,
            self.metadata.mtime,
            self.metadata.mtime_nsec,
            self.metadata.dev,
            self.metadata.ino,
            self.metadata.mode,
            self.metadata.uid,
            self.metadata.gid,
            self.metadata.size,
        ] {
            entry_bytes.write_u32::<byteorder::NetworkEndian>(field)?;
        }
        self.oid.write_h40_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(path_length)?;
        entry_bytes.write_all(self.name.as_bytes())?;

        entry_bytes.resize(Self::padded_size(self.name.len()), 0);

        Ok(Bytes::from(entry_bytes))
    }
}

impl Unpackable for IndexEntry {
    /// Parse exactly one padded entry; the reader must hold the entry and nothing else
    fn deserialize(mut reader: impl BufRead) -> anyhow::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        if bytes.len() < ENTRY_FIXED_SIZE {
            return Err(RepositoryError::index_corrupt("truncated index entry").into());
        }

        let mut fields = [0u32; 10];
        byteorder::NetworkEndian::read_u32_into(&bytes[..STAT_SIZE], &mut fields);
        let [
            ctime,
            ctime_nsec,
            mtime,
            mtime_nsec,
            dev,
            ino,
            mode,
            uid,
            gid,
            size,
        ] = fields;

        let mut oid_bytes = [0u8; OBJECT_ID_BYTES];
        oid_bytes.copy_from_slice(&bytes[STAT_SIZE..STAT_SIZE + OBJECT_ID_BYTES]);
        let oid = ObjectId::from_bytes(&oid_bytes);

        let path_length =
            byteorder::NetworkEndian::read_u16(&bytes[ENTRY_FIXED_SIZE - 2..ENTRY_FIXED_SIZE])
                as usize;
        if bytes.len() != Self::padded_size(path_length) {
            return Err(RepositoryError::index_corrupt(format!(
                "entry size {} does not match path length {}",
                bytes.len(),
                path_length
            ))
            .into());
        }

        let path_end = ENTRY_FIXED_SIZE + path_length;
        if bytes[path_end..].iter().any(|&b| b != 0) {
            return Err(RepositoryError::index_corrupt("non-zero entry padding").into());
        }

        let name = std::str::from_utf8(&bytes[ENTRY_FIXED_SIZE..path_end])
            .map_err(|_| RepositoryError::index_corrupt("invalid UTF-8 in entry path"))?
            .to_string();

        Ok(IndexEntry {
            name,
            oid,
            metadata: EntryMetadata {
                ctime,
                ctime_nsec,
                mtime,
                mtime_nsec,
                dev,
                ino,
                mode,
                uid,
                gid,
                size,
            },
        })
    }
}

impl TryFrom<(&Path, Metadata)> for EntryMetadata {
    type Error = anyhow::Error;

    /// `file_path` must be resolvable from the current directory (absolute in practice)
    fn try_from((file_path, metadata): (&Path, Metadata)) -> Result<Self, Self::Error> {
        if !metadata.is_file() {
            anyhow::bail!("Not a regular file: {}", file_path.display());
        }

        let mode = match file_path.is_executable() {
            true => EntryMode::File(FileMode::Executable),
            false => EntryMode::File(FileMode::Regular),
        };

        Ok(Self {
            ctime: metadata.ctime() as u32,
            ctime_nsec: metadata.ctime_nsec() as u32,
            mtime: metadata.mtime() as u32,
            mtime_nsec: metadata.mtime_nsec() as u32,
            dev: metadata.dev() as u32,
            ino: metadata.ino() as u32,
            mode: mode.as_u32(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size() as u32,
        })
    }
}
