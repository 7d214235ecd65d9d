use crate::areas::layout::GIT_DIR;
use crate::artifacts::index::index_entry::{EntryMetadata, MAX_PATH_SIZE};
use crate::artifacts::objects::blob::Blob;
use crate::errors::RepositoryError;
use anyhow::Context;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Working tree rooted at the repository root
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    /// Check that `path` can be stored as an index/tree path
    ///
    /// Accepted paths are relative, `/`-separated, and contain no empty, `.`, `..` or
    /// metadata-directory components.
    pub fn validate_path(path: &str) -> anyhow::Result<()> {
        let reject = |reason: &str| -> anyhow::Result<()> {
            Err(RepositoryError::invalid_path(path, reason).into())
        };

        if path.is_empty() {
            return reject("empty path");
        }
        if path.starts_with('/') {
            return reject("absolute path");
        }
        if path.ends_with('/') {
            return reject("trailing separator");
        }
        if path.len() > MAX_PATH_SIZE {
            return reject("path too long");
        }

        for component in path.split('/') {
            match component {
                "" => return reject("empty path component"),
                "." | ".." => return reject("relative path component"),
                GIT_DIR => return reject("inside the repository metadata directory"),
                _ => {}
            }
        }

        Ok(())
    }

    /// Turn a user supplied path into a validated repository-relative path
    ///
    /// Relative paths are taken from the working tree root. The root itself maps to `""`.
    pub fn resolve(&self, user_path: &Path) -> anyhow::Result<String> {
        let absolute = self
            .path
            .join(user_path)
            .canonicalize()
            .map_err(|_| RepositoryError::PathNotFound(user_path.to_path_buf()))?;

        let relative = absolute.strip_prefix(&self.path).map_err(|_| {
            RepositoryError::invalid_path(
                user_path.to_string_lossy(),
                "outside the repository",
            )
        })?;

        let relative = Self::to_slash_path(relative)?;
        if !relative.is_empty() {
            Self::validate_path(&relative)?;
        }

        Ok(relative)
    }

    /// Regular files at or below `relative` (`""` for the whole tree), sorted by path
    ///
    /// Symlinks are not followed and the metadata directory is skipped.
    pub fn list_files(&self, relative: &str) -> anyhow::Result<Vec<String>> {
        let root = self.absolute(relative);

        if root.is_file() {
            return Ok(vec![relative.to_string()]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != GIT_DIR)
        {
            let entry = entry
                .with_context(|| format!("Unable to walk directory {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.path)
                .context("Walked outside of the working tree")?;
            let relative = Self::to_slash_path(relative)?;
            Self::validate_path(&relative)?;
            files.push(relative);
        }

        files.sort();
        Ok(files)
    }

    pub fn read_file(&self, relative: &str) -> anyhow::Result<Vec<u8>> {
        let file_path = self.absolute(relative);

        std::fs::read(&file_path)
            .with_context(|| format!("Unable to read file {}", file_path.display()))
    }

    pub fn parse_blob(&self, relative: &str) -> anyhow::Result<Blob> {
        Ok(Blob::from(self.read_file(relative)?))
    }

    pub fn stat_file(&self, relative: &str) -> anyhow::Result<EntryMetadata> {
        let file_path = self.absolute(relative);
        let metadata = std::fs::metadata(&file_path)
            .with_context(|| format!("Unable to stat file {}", file_path.display()))?;

        (file_path.as_path(), metadata).try_into()
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        match relative {
            "" => self.path.to_path_buf(),
            _ => self.path.join(relative),
        }
    }

    fn to_slash_path(relative: &Path) -> anyhow::Result<String> {
        let mut components = Vec::new();

        for component in relative.components() {
            let Component::Normal(name) = component else {
                return Err(RepositoryError::invalid_path(
                    relative.to_string_lossy(),
                    "unexpected path component",
                )
                .into());
            };
            let name = name.to_str().ok_or_else(|| {
                RepositoryError::invalid_path(relative.to_string_lossy(), "path is not valid UTF-8")
            })?;
            components.push(name);
        }

        Ok(components.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn work_dir() -> TempDir {
        TempDir::new().expect("Failed to create temp dir")
    }

    fn workspace(dir: &TempDir) -> Workspace {
        Workspace::new(dir.path().canonicalize().unwrap().into_boxed_path())
    }

    fn is_invalid_path(result: anyhow::Result<()>) -> bool {
        matches!(
            result.unwrap_err().downcast_ref::<RepositoryError>(),
            Some(RepositoryError::InvalidPath { .. })
        )
    }

    #[rstest]
    #[case("a.txt")]
    #[case("dir/nested/a.txt")]
    #[case(".gitignore")]
    #[case("dir/.hidden")]
    fn valid_paths(#[case] path: &str) {
        assert!(Workspace::validate_path(path).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("/etc/passwd")]
    #[case("dir/")]
    #[case("a//b")]
    #[case("./a")]
    #[case("a/../b")]
    #[case(".git/config")]
    #[case("sub/.git/HEAD")]
    fn invalid_paths(#[case] path: &str) {
        assert!(is_invalid_path(Workspace::validate_path(path)));
    }

    #[test]
    fn overlong_path_is_invalid() {
        let path = "a".repeat(MAX_PATH_SIZE + 1);
        assert!(is_invalid_path(Workspace::validate_path(&path)));
    }

    #[rstest]
    fn missing_target_is_path_not_found(work_dir: TempDir) {
        let workspace = workspace(&work_dir);

        let error = workspace
            .resolve(&work_dir.path().join("missing.txt"))
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<RepositoryError>(),
            Some(RepositoryError::PathNotFound(_))
        ));
    }

    #[rstest]
    fn resolve_yields_slash_separated_relative_paths(work_dir: TempDir) {
        work_dir.child("dir/sub/a.txt").write_str("a").unwrap();
        let workspace = workspace(&work_dir);

        assert_eq!(
            workspace
                .resolve(&work_dir.path().join("dir/sub/a.txt"))
                .unwrap(),
            "dir/sub/a.txt"
        );
        assert_eq!(workspace.resolve(work_dir.path()).unwrap(), "");
    }

    #[rstest]
    fn relative_paths_start_at_the_working_tree(work_dir: TempDir) {
        work_dir.child("dir/a.txt").write_str("a").unwrap();
        let workspace = workspace(&work_dir);

        assert_eq!(workspace.resolve(Path::new("dir/a.txt")).unwrap(), "dir/a.txt");
        assert_eq!(workspace.resolve(Path::new(".")).unwrap(), "");
        assert!(is_invalid_path(
            workspace.resolve(Path::new("..")).map(|_| ())
        ));
    }

    #[rstest]
    fn metadata_dir_cannot_be_resolved(work_dir: TempDir) {
        work_dir.child(".git/HEAD").write_str("ref: refs/heads/main\n").unwrap();
        let workspace = workspace(&work_dir);

        let error = workspace.resolve(&work_dir.path().join(".git/HEAD"));

        assert!(is_invalid_path(error.map(|_| ())));
    }

    #[rstest]
    fn outside_path_is_invalid(work_dir: TempDir) {
        let outside = TempDir::new().unwrap();
        outside.child("x.txt").write_str("x").unwrap();
        let workspace = workspace(&work_dir);

        let error = workspace.resolve(&outside.path().join("x.txt"));

        assert!(is_invalid_path(error.map(|_| ())));
    }

    #[rstest]
    fn listing_skips_metadata_dir(work_dir: TempDir) {
        work_dir.child("b.txt").write_str("b").unwrap();
        work_dir.child("a/z.txt").write_str("z").unwrap();
        work_dir.child("a/c/d.txt").write_str("d").unwrap();
        work_dir.child(".git/HEAD").write_str("ref: refs/heads/main\n").unwrap();
        work_dir.child(".git/objects/ab/cdef").write_str("x").unwrap();
        let workspace = workspace(&work_dir);

        assert_eq!(
            workspace.list_files("").unwrap(),
            vec!["a/c/d.txt", "a/z.txt", "b.txt"]
        );
        assert_eq!(workspace.list_files("a/c").unwrap(), vec!["a/c/d.txt"]);
        assert_eq!(workspace.list_files("b.txt").unwrap(), vec!["b.txt"]);
    }

    #[cfg(unix)]
    #[rstest]
    fn listing_does_not_follow_symlinks(work_dir: TempDir) {
        work_dir.child("real/a.txt").write_str("a").unwrap();
        std::os::unix::fs::symlink(work_dir.path().join("real"), work_dir.path().join("link"))
            .unwrap();
        std::os::unix::fs::symlink(work_dir.path(), work_dir.path().join("real/loop")).unwrap();
        let workspace = workspace(&work_dir);

        assert_eq!(workspace.list_files("").unwrap(), vec!["real/a.txt"]);
    }

    #[rstest]
    fn stat_captures_size_and_mode(work_dir: TempDir) {
        work_dir.child("a.txt").write_str("hello").unwrap();
        let workspace = workspace(&work_dir);

        let metadata = workspace.stat_file("a.txt").unwrap();

        assert_eq!(metadata.size, 5);
        assert_eq!(metadata.mode, 0o100644);
        assert_eq!(workspace.read_file("a.txt").unwrap(), b"hello");
    }
}
