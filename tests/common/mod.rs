use std::path::Path;

use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature};

/// Initialize a non-bare repository with a deterministic default branch
/// and identity, and ambient autocrlf disabled so fixture bytes reach the
/// object store untouched.
pub fn init_repo(dir: &Path) -> Repository {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("master");
    let repo = Repository::init_opts(dir, &opts).unwrap();
    let mut cfg = repo.config().unwrap();
    cfg.set_str("user.name", "covdiff-test").unwrap();
    cfg.set_str("user.email", "covdiff@localhost").unwrap();
    cfg.set_str("core.autocrlf", "false").unwrap();
    repo
}

pub fn write_file(root: &Path, rel: &str, content: impl AsRef<[u8]>) {
    let full = root.join(rel);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(full, content).unwrap();
}

/// Stage everything and commit, returning the new commit id.
pub fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
    let mut index = repo.index().unwrap();
    index.add_all(["*"], IndexAddOption::DEFAULT, None).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("covdiff-test", "covdiff@localhost").unwrap();
    match repo.head().ok().and_then(|h| h.target()) {
        Some(parent_id) => {
            let parent = repo.find_commit(parent_id).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
                .unwrap()
        }
        None => repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
            .unwrap(),
    }
}

/// Repository with one commit containing a single file.
#[allow(dead_code)]
pub fn single_file_repo(dir: &Path, rel: &str, content: &str) -> Repository {
    let repo = init_repo(dir);
    write_file(dir, rel, content);
    commit_all(&repo, "initial");
    repo
}
