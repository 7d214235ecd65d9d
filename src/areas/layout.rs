use derive_new::new;
use std::path::{Path, PathBuf};

/// Name of the repository metadata directory
pub const GIT_DIR: &str = ".git";

/// Branch HEAD points at in a fresh repository
pub const DEFAULT_BRANCH: &str = "main";

/// File locations of a repository, all derived from the working tree root
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct RepositoryLayout {
    root: PathBuf,
}

impl RepositoryLayout {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git_path(&self) -> PathBuf {
        self.root.join(GIT_DIR)
    }

    pub fn objects_path(&self) -> PathBuf {
        self.git_path().join("objects")
    }

    pub fn index_path(&self) -> PathBuf {
        self.git_path().join("index")
    }

    pub fn head_path(&self) -> PathBuf {
        self.git_path().join("HEAD")
    }

    pub fn refs_path(&self) -> PathBuf {
        self.git_path().join("refs")
    }

    pub fn heads_path(&self) -> PathBuf {
        self.refs_path().join("heads")
    }

    pub fn is_initialized(&self) -> bool {
        self.objects_path().is_dir()
    }
}
