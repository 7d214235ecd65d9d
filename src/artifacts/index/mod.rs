//! Git index file format
//!
//! The index (also called staging area or cache) records what goes into the next commit.
//!
//! ## File Format (Version 2, big-endian)
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "DIRC" (4 bytes)
//!   - Version: 2 (4 bytes)
//!   - Entry count (4 bytes)
//!
//! Entries (variable length):
//!   - 10 x u32 stat fields, 20-byte object ID, u16 path length, path bytes
//!   - NUL padded to a multiple of 8 bytes, counted from the start of the entries region
//!
//! Checksum (20 bytes):
//!   - SHA-1 hash of header and entries
//! ```

pub mod checksum;
pub mod entry_mode;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &str = "DIRC";

/// Index file format version
pub const VERSION: u32 = 2;
