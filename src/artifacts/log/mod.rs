//! Commit history traversal
//!
//! History is a singly linked chain: every commit names at most one parent. [`RevList`]
//! walks that chain from a starting commit back to the root commit, newest first.

pub mod rev_list;

use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// A commit together with the ID it is stored under
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct LogEntry {
    pub oid: ObjectId,
    pub commit: Commit,
}
