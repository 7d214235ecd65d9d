//! Command implementations
//!
//! Each porcelain command is an `impl Repository` block that loads the areas it needs,
//! performs the operation, and reports to the repository writer.

pub mod porcelain;
