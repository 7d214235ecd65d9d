//! Git data structures and algorithms
//!
//! - `index`: Staging index entries, header, checksum and file modes
//! - `log`: Commit history traversal
//! - `objects`: Git object types (blob, tree, commit) and the tree builder

pub mod index;
pub mod log;
pub mod objects;
