//! Porcelain commands (user-facing operations)
//!
//! ## Commands
//!
//! - `init`: Initialize a new repository
//! - `add`: Stage files for commit
//! - `commit`: Create a new commit from the staged files
//! - `log`: Show commit history

pub mod add;
pub mod commit;
pub mod init;
pub mod log;
