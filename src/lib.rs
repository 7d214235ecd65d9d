//! A minimal Git-compatible storage engine
//!
//! - `areas`: object database, staging index, refs and working directory access
//! - `artifacts`: object, index and history data structures
//! - `commands`: `init`, `add`, `commit` and `log` orchestration
//! - `errors`: typed failures raised by the areas

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;
