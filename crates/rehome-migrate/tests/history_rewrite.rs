//! Tests against the real `git` binary.
//!
//! Each test is skipped when `git` is not on `PATH`.

use std::path::Path;
use std::process::Command;

use rehome_migrate::git::{ensure_initial_commit, BACKUP_REFS};
use rehome_migrate::{HistoryRewritePort, Identity, PushEngine, SystemGit, WorkingCopyPort};

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Creates a repository with two commits by an old identity and returns it.
fn seeded_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    git(repo, &["init", "-q", "-b", "main"]);

    let old = ["-c", "user.name=Old Name", "-c", "user.email=old@example.com"];

    std::fs::write(repo.join("a.txt"), "a").unwrap();
    git(repo, &["add", "."]);
    git(repo, &[&old[..], &["commit", "-q", "-m", "first"]].concat());

    std::fs::write(repo.join("b.txt"), "b").unwrap();
    git(repo, &["add", "."]);
    git(
        repo,
        &[&old[..], &["commit", "-q", "-m", "修正: ユニコードのメッセージ"]].concat(),
    );
    git(repo, &["tag", "v1"]);

    dir
}

#[test]
fn rewrite_replaces_authorship_and_keeps_messages() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let dir = seeded_repo();
    let repo = dir.path();
    let identity = Identity::new("New Name", "new@example.com");

    SystemGit::new().rewrite_history(repo, &identity).unwrap();

    let authors = git(repo, &["log", "--all", "--format=%an|%ae|%cn|%ce"]);
    for line in authors.lines() {
        assert_eq!(line, "New Name|new@example.com|New Name|new@example.com");
    }
    assert_eq!(
        git(repo, &["log", "-1", "--format=%s"]),
        "修正: ユニコードのメッセージ"
    );
    assert_eq!(
        git(repo, &["log", "-1", "--format=%an", "v1"]),
        "New Name"
    );
}

#[test]
fn second_rewrite_changes_nothing() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let dir = seeded_repo();
    let repo = dir.path();
    let identity = Identity::new("New Name", "new@example.com");
    let git_port = SystemGit::new();

    git_port.rewrite_history(repo, &identity).unwrap();
    assert!(repo.join(BACKUP_REFS).exists());
    let head = git(repo, &["rev-parse", "HEAD"]);

    git_port.rewrite_history(repo, &identity).unwrap();
    assert_eq!(git(repo, &["rev-parse", "HEAD"]), head);
}

#[test]
fn empty_repository_gets_initial_commit() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let repo = dir.path();
    let git_port = SystemGit::new();
    git_port.init(repo).unwrap();
    let identity = Identity::new("New Name", "new@example.com");

    assert!(!git_port.has_commits(repo).unwrap());
    assert!(ensure_initial_commit(&git_port, repo, &identity).unwrap());
    assert!(git_port.has_commits(repo).unwrap());
    assert!(repo.join("README.md").exists());
    assert_eq!(git(repo, &["log", "-1", "--format=%s|%an"]), "Initial commit|New Name");

    assert!(!ensure_initial_commit(&git_port, repo, &identity).unwrap());
}

#[test]
fn rewritten_history_is_force_pushed() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let remote = tempfile::tempdir().unwrap();
    git(remote.path(), &["init", "-q", "--bare"]);

    let dir = seeded_repo();
    let repo = dir.path();
    let remote_path = remote.path().to_string_lossy().into_owned();
    git(repo, &["remote", "add", "origin", &remote_path]);

    let git_port = SystemGit::new();
    let engine = PushEngine::new(&git_port, None);
    engine.push(repo, "HEAD:refs/heads/main").unwrap();

    git_port
        .rewrite_history(repo, &Identity::new("New Name", "new@example.com"))
        .unwrap();

    // rewritten commits are not a fast-forward of what the remote holds
    engine.push(repo, "HEAD:refs/heads/main").unwrap();
    engine.push_all(repo).unwrap();

    assert_eq!(
        git(remote.path(), &["rev-parse", "refs/heads/main"]),
        git(repo, &["rev-parse", "HEAD"])
    );
    assert_eq!(
        git(remote.path(), &["log", "-1", "--format=%an", "v1"]),
        "New Name"
    );
}
