use calsync::LastSynced;
use calsync::git::{GitController, GitError, LogFilter};
use chrono::DateTime;
use std::fs;
use tempfile::TempDir;

fn new_repo() -> (TempDir, GitController) {
    let dir = tempfile::tempdir().unwrap();
    let mut git = GitController::open(dir.path(), true).unwrap();
    git.init().unwrap();
    git.config_user(Some("Tester"), Some("tester@example.com"))
        .unwrap();
    (dir, git)
}

fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn author_times(dir: &TempDir) -> Vec<i64> {
    let repo = git2::Repository::open(dir.path()).unwrap();
    let mut walk = repo.revwalk().unwrap();
    walk.set_sorting(git2::Sort::TOPOLOGICAL).unwrap();
    walk.push_head().unwrap();
    let mut times: Vec<i64> = walk
        .map(|oid| repo.find_commit(oid.unwrap()).unwrap().author().when().seconds())
        .collect();
    times.reverse();
    times
}

#[test]
fn plain_directory_is_rejected_unless_allowed() {
    let dir = tempfile::tempdir().unwrap();

    let err = GitController::open(dir.path(), false).err().unwrap();
    assert!(matches!(err, GitError::NotAGitRepository { .. }));
    assert!(err.to_string().contains("is not a root of a git repository"));

    let git = GitController::open(dir.path(), true).unwrap();
    assert!(!git.is_initialized());
    assert!(git.git_path().is_some());
}

#[test]
fn subdirectory_of_repository_is_rejected_either_way() {
    let (dir, _git) = new_repo();
    let sub = dir.path().join("nested");
    fs::create_dir(&sub).unwrap();

    for allow in [false, true] {
        let err = GitController::open(&sub, allow).err().unwrap();
        assert!(
            matches!(&err, GitError::NotAGitRepository { path } if *path == sub),
            "allow={allow}: {err}"
        );
    }
}

#[test]
fn reopening_an_initialized_root_succeeds() {
    let (dir, _git) = new_repo();
    let git = GitController::open(dir.path(), false).unwrap();
    assert!(git.is_initialized());
}

#[test]
fn empty_repository_has_never_synced() {
    let (_dir, git) = new_repo();
    let cursor = git.last_author_date(&LogFilter::default()).unwrap();
    assert_eq!(cursor, LastSynced::Never);
}

#[test]
fn author_filter_tracks_matching_commits_only() {
    let (_dir, git) = new_repo();
    let filter = LogFilter::default().author("Xavier");

    git.commit(
        "by someone else",
        true,
        &env(&[("GIT_AUTHOR_NAME", "Yolanda"), ("GIT_AUTHOR_DATE", "@1600000000 +0000")]),
    )
    .unwrap();
    assert_eq!(git.last_author_date(&filter).unwrap(), LastSynced::Never);

    git.commit(
        "by xavier",
        true,
        &env(&[("GIT_AUTHOR_NAME", "Xavier"), ("GIT_AUTHOR_DATE", "@1650000000 +0000")]),
    )
    .unwrap();
    assert_eq!(
        git.last_author_date(&filter).unwrap(),
        LastSynced::At(DateTime::from_timestamp(1_650_000_000, 0).unwrap())
    );
}

#[test]
fn message_filter_selects_by_grep() {
    let (_dir, git) = new_repo();
    git.commit("alpha", true, &env(&[("GIT_AUTHOR_DATE", "@1500000000 +0000")]))
        .unwrap();
    git.commit("beta", true, &env(&[("GIT_AUTHOR_DATE", "@1500000100 +0000")]))
        .unwrap();

    let alpha = git
        .last_author_date(&LogFilter::default().message("^alpha$"))
        .unwrap();
    assert_eq!(alpha.as_datetime().unwrap().timestamp(), 1_500_000_000);

    let none = git
        .last_author_date(&LogFilter::default().message("^gamma$"))
        .unwrap();
    assert_eq!(none, LastSynced::Never);
}

#[test]
fn commit_is_stamped_with_author_date() {
    let (dir, git) = new_repo();
    git.commit(
        "activity",
        true,
        &env(&[("GIT_AUTHOR_DATE", "@1700000000 +0000")]),
    )
    .unwrap();

    assert_eq!(author_times(&dir), vec![1_700_000_000]);
    let status = git.exec(&["status", "--porcelain"], &[]).unwrap();
    assert!(status.trim().is_empty());
}

#[test]
fn commit_without_changes_needs_allow_empty() {
    let (dir, git) = new_repo();
    let err = git.commit("nothing", false, &[]).unwrap_err();
    assert!(matches!(err, GitError::NonZeroExit { .. }));

    let repo = git2::Repository::open(dir.path()).unwrap();
    assert!(repo.head().is_err());
}

#[test]
fn exec_raises_non_zero_exit() {
    let (_dir, git) = new_repo();
    let err = git
        .exec(&["rev-parse", "--verify", "no-such-ref"], &[])
        .unwrap_err();
    match err {
        GitError::NonZeroExit { args, code, .. } => {
            assert_eq!(args, "rev-parse --verify no-such-ref");
            assert_ne!(code, Some(0));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn push_without_remote_fails() {
    let (_dir, git) = new_repo();
    git.commit("activity", true, &[]).unwrap();
    assert!(matches!(git.push().unwrap_err(), GitError::NonZeroExit { .. }));
}
