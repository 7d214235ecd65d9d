use derive_new::new;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Eq, PartialEq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: String,
}

pub fn write_file(file_spec: FileSpec) {
    if let Some(parent) = file_spec.path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }

    std::fs::write(&file_spec.path, file_spec.content).expect("Failed to write file");
}

/// Write randomly named files into `dir`, returning their content keyed by file name
pub fn write_generated_files(dir: &Path, files_count: usize) -> BTreeMap<String, String> {
    use fake::{
        Fake,
        faker::lorem::en::{Word, Words},
    };

    let mut files = BTreeMap::new();
    while files.len() < files_count {
        let file_name = format!("{}.txt", Word().fake::<String>());
        if files.contains_key(&file_name) {
            continue;
        }

        let file_content = Words(5..10).fake::<Vec<String>>().join(" ");
        write_file(FileSpec::new(dir.join(&file_name), file_content.clone()));
        files.insert(file_name, file_content);
    }

    files
}
