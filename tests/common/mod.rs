#![allow(dead_code)]

pub mod command;
pub mod file;

use mygit::areas::database::Database;
use mygit::areas::index::Index;
use std::path::Path;

pub fn load_index(dir: &Path) -> Index {
    let mut index = Index::new(dir.join(".git/index").into_boxed_path());
    index.rehydrate().expect("Failed to load index");
    index
}

pub fn open_database(dir: &Path) -> Database {
    Database::new(dir.join(".git/objects").into_boxed_path())
}

/// Number of object files in the database
pub fn count_objects(dir: &Path) -> usize {
    walkdir::WalkDir::new(dir.join(".git/objects"))
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count()
}

pub fn read_head_commit(dir: &Path) -> Option<String> {
    std::fs::read_to_string(dir.join(".git/refs/heads/main")).ok()
}
