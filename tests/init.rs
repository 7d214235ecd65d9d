use crate::common::command::{repository_dir, run_mygit_command};
use assert_fs::TempDir;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn init_repository_successfully(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let git_dir = repository_dir.path().canonicalize()?.join(".git");

    run_mygit_command(repository_dir.path(), &["init"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"^Initialized empty Git repository in .+\n$",
        )?)
        .stdout(predicate::str::contains(git_dir.display().to_string()));

    assert!(git_dir.join("objects").is_dir());
    assert!(git_dir.join("refs/heads").is_dir());
    assert_eq!(
        std::fs::read_to_string(git_dir.join("HEAD"))?,
        "ref: refs/heads/main\n"
    );
    assert_eq!(std::fs::read(git_dir.join("index"))?.len(), 0);
    assert!(!git_dir.join("refs/heads/main").exists());

    Ok(())
}

#[rstest]
fn init_repository_at_a_new_path(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    let target = repository_dir.path().join("nested").join("project");

    run_mygit_command(repository_dir.path(), &["init", "nested/project"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Initialized empty Git repository in",
        ));

    assert!(target.join(".git/objects").is_dir());
    assert!(!repository_dir.path().join(".git").exists());

    Ok(())
}

#[rstest]
fn reinit_keeps_existing_head(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_mygit_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    let head = repository_dir.path().join(".git/HEAD");
    std::fs::write(&head, "ref: refs/heads/topic\n")?;

    run_mygit_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&head)?, "ref: refs/heads/topic\n");

    Ok(())
}

#[rstest]
fn commands_outside_a_repository_fail(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    run_mygit_command(repository_dir.path(), &["log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a git repository"));

    Ok(())
}
