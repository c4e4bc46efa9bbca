use std::fs;

use git2::{IndexAddOption, Repository as GitRepository, RepositoryInitOptions, Signature};
use guck_core::ffi::{open, CoreError};
use guck_core::{ComparisonRequest, DiffMode, FileStatus};
use tempfile::TempDir;

#[test]
fn ffi_session_computes_working_diff() {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = init_repo(&temp);
    fs::write(temp.path().join("a.txt"), "a\n").expect("write file");
    commit_all(&git_repo);
    fs::write(temp.path().join("a.txt"), "a\nb\n").expect("write file");
    fs::write(temp.path().join("b.txt"), "b\n").expect("write file");

    let session = open(temp.path().to_string_lossy().into_owned()).expect("open session");
    let files = session
        .compute_diff(ComparisonRequest::working())
        .expect("working diff");

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].path, "a.txt");
    assert_eq!(files[0].status, FileStatus::Modified);
    assert_eq!(files[1].path, "b.txt");
    assert_eq!(files[1].status, FileStatus::Untracked);

    let info = session.repository_info().expect("repository info");
    assert_eq!(info.branch, "main");
    assert!(info.commit.is_some());
    assert_eq!(session.default_branch(), "main");
}

#[test]
fn ffi_session_maps_errors() {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = init_repo(&temp);
    fs::write(temp.path().join("a.txt"), "a\n").expect("write file");
    commit_all(&git_repo);

    let session = open(temp.path().to_string_lossy().into_owned()).expect("open session");
    match session.compute_diff(ComparisonRequest::branch("nope")) {
        Err(CoreError::BranchNotFound) => {}
        other => panic!("expected missing branch, got {other:?}"),
    }

    let request = ComparisonRequest {
        mode: DiffMode::Branch,
        base_branch: "main".into(),
    };
    let files = session.compute_diff(request).expect("branch diff");
    assert!(files.is_empty());

    // Cancelling with nothing in flight does not poison later requests.
    session.cancel();
    assert!(session.compute_diff(ComparisonRequest::staged()).is_ok());
}

#[test]
fn ffi_open_rejects_plain_directory() {
    let temp = TempDir::new().expect("tempdir");
    match open(temp.path().to_string_lossy().into_owned()) {
        Err(CoreError::NotARepository) => {}
        other => panic!("expected not-a-repository, got {other:?}"),
    }
}

fn init_repo(temp: &TempDir) -> GitRepository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    GitRepository::init_opts(temp.path(), &opts).expect("init repo")
}

fn commit_all(repo: &GitRepository) {
    let mut index = repo.index().expect("index");
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .expect("stage files");
    index.write().expect("write index");
    let tree = repo
        .find_tree(index.write_tree().expect("write tree"))
        .expect("find tree");
    let signature = Signature::now("Test", "test@example.com").expect("signature");
    repo.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
        .expect("commit");
}
