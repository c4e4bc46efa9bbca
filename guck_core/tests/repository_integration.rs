use std::fs;
use std::path::Path;

use git2::{IndexAddOption, Oid, Repository as GitRepository, RepositoryInitOptions};
use guck_core::{Error, Repository, Result};
use tempfile::TempDir;

#[test]
fn open_discovers_root_from_nested_directory() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    init_repo(temp.path(), "main")?;
    write_file(temp.path(), "src/deep/mod.rs", "// nested\n");

    let repo = Repository::open(temp.path().join("src/deep"))?;
    let expected = fs::canonicalize(temp.path()).expect("canonical tempdir");

    assert_eq!(
        fs::canonicalize(repo.root()).expect("canonical root"),
        expected
    );

    Ok(())
}

#[test]
fn open_rejects_bare_repository() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    GitRepository::init_bare(temp.path()).map_err(Error::from)?;

    let result = Repository::open(temp.path());
    assert!(matches!(result, Err(Error::BareRepository { .. })));

    Ok(())
}

#[test]
fn open_rejects_missing_path() {
    let temp = TempDir::new().expect("tempdir");
    let result = Repository::open(temp.path().join("missing"));
    assert!(matches!(result, Err(Error::Io { .. })));
}

#[test]
fn remote_url_reflects_origin() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = init_repo(temp.path(), "main")?;

    let repo = Repository::open(temp.path())?;
    assert_eq!(repo.remote_url()?, None);

    git_repo
        .remote("origin", "https://example.com/guck.git")
        .map_err(Error::from)?;
    let repo = Repository::open(temp.path())?;
    assert_eq!(
        repo.remote_url()?.as_deref(),
        Some("https://example.com/guck.git")
    );

    Ok(())
}

#[test]
fn default_branch_follows_origin_head() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = init_repo(temp.path(), "main")?;
    write_file(temp.path(), "README.md", "hello\n");
    let oid = commit_all(&git_repo, "initial")?;

    git_repo
        .reference("refs/remotes/origin/develop", oid, true, "fetch")
        .map_err(Error::from)?;
    git_repo
        .reference_symbolic(
            "refs/remotes/origin/HEAD",
            "refs/remotes/origin/develop",
            true,
            "clone",
        )
        .map_err(Error::from)?;

    let repo = Repository::open(temp.path())?;
    assert_eq!(repo.default_branch(), "develop");

    Ok(())
}

#[test]
fn default_branch_probes_well_known_names() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = init_repo(temp.path(), "trunk")?;
    write_file(temp.path(), "README.md", "hello\n");
    let oid = commit_all(&git_repo, "initial")?;

    let repo = Repository::open(temp.path())?;
    assert_eq!(repo.default_branch(), "main");

    let commit = git_repo.find_commit(oid).map_err(Error::from)?;
    git_repo
        .branch("master", &commit, false)
        .map_err(Error::from)?;
    assert_eq!(repo.default_branch(), "master");

    Ok(())
}

#[test]
fn info_reports_branch_commit_and_remote() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = init_repo(temp.path(), "main")?;

    let repo = Repository::open(temp.path())?;
    let unborn = repo.info()?;
    assert_eq!(unborn.branch, "main");
    assert_eq!(unborn.commit, None);
    assert_eq!(unborn.default_branch, "main");

    write_file(temp.path(), "README.md", "hello\n");
    let oid = commit_all(&git_repo, "initial")?;
    git_repo
        .remote("origin", "git@example.com:guck.git")
        .map_err(Error::from)?;

    let repo = Repository::open(temp.path())?;
    let info = repo.info()?;
    assert_eq!(info.commit, Some(oid.to_string()));
    assert_eq!(info.remote_url.as_deref(), Some("git@example.com:guck.git"));
    assert_eq!(repo.current_commit()?, oid.to_string());

    let encoded = serde_json::to_value(&info).expect("encode info");
    assert_eq!(encoded["branch"], "main");

    Ok(())
}

#[test]
fn change_flags_track_worktree_and_index() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = init_repo(temp.path(), "main")?;
    write_file(temp.path(), ".gitignore", "target/\n");
    write_file(temp.path(), "README.md", "hello\n");
    commit_all(&git_repo, "initial")?;

    let repo = Repository::open(temp.path())?;
    assert!(!repo.has_uncommitted_changes()?);
    assert!(!repo.has_staged_changes()?);

    write_file(temp.path(), "target/build.out", "artifact\n");
    assert!(!repo.has_uncommitted_changes()?);

    write_file(temp.path(), "notes.txt", "draft\n");
    assert!(repo.has_uncommitted_changes()?);
    assert!(!repo.has_staged_changes()?);

    let mut index = git_repo.index().map_err(Error::from)?;
    index
        .add_path(Path::new("notes.txt"))
        .map_err(Error::from)?;
    index.write().map_err(Error::from)?;
    assert!(repo.has_staged_changes()?);

    Ok(())
}

#[test]
fn file_contents_at_head_and_in_worktree() -> Result<()> {
    let temp = TempDir::new().expect("tempdir");
    let git_repo = init_repo(temp.path(), "main")?;

    let repo = Repository::open(temp.path())?;
    assert!(matches!(
        repo.file_at_head("README.md"),
        Err(Error::NoCommits)
    ));

    write_file(temp.path(), "docs/README.md", "committed\n");
    commit_all(&git_repo, "initial")?;
    write_file(temp.path(), "docs/README.md", "edited\n");

    assert_eq!(repo.file_at_head("docs/README.md")?, "committed\n");
    assert_eq!(repo.working_file("docs/README.md")?, "edited\n");
    assert!(matches!(
        repo.file_at_head("docs/missing.md"),
        Err(Error::PathNotFound { .. })
    ));
    assert!(matches!(
        repo.working_file("docs/missing.md"),
        Err(Error::PathNotFound { .. })
    ));
    assert!(matches!(
        repo.working_file("../outside.txt"),
        Err(Error::PathOutsideRepository { .. })
    ));

    Ok(())
}

fn init_repo(path: &Path, initial_head: &str) -> Result<GitRepository> {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(initial_head);
    GitRepository::init_opts(path, &opts).map_err(Error::from)
}

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(path, contents).expect("write file");
}

fn commit_all(repo: &GitRepository, message: &str) -> Result<Oid> {
    let mut index = repo.index().map_err(Error::from)?;
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .map_err(Error::from)?;
    index.write().map_err(Error::from)?;
    let tree_id = index.write_tree().map_err(Error::from)?;
    let tree = repo.find_tree(tree_id).map_err(Error::from)?;
    let signature = git2::Signature::now("Test", "test@example.com").map_err(Error::from)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(Error::from)?),
        Err(_) => None,
    };
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parents,
    )
    .map_err(Error::from)
}
