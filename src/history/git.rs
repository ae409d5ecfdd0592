// Git-backed history loader
use git2::{Commit, ErrorCode, Repository};
use std::path::Path;

use crate::error::Result;
use crate::history::{CommitChain, CommitRecord};

/// Linearize the first-parent history of one file into a commit chain
///
/// Only commits that change the file's content are kept; each kept record's
/// parent is the previous kept record, so the chain reads as the file's own
/// history. A file missing from a tree counts as empty content.
///
/// # Arguments
/// * `repo_path` - Any path inside the repository
/// * `file_path` - File path relative to the repository root
/// * `rev` - Revision to start from (e.g. "HEAD", a branch or a commit id)
/// * `max_commits` - Stop after this many kept commits
pub fn load_file_history(
    repo_path: &Path,
    file_path: &Path,
    rev: &str,
    max_commits: Option<usize>,
) -> Result<CommitChain> {
    let repo = Repository::discover(repo_path)?;
    let mut current = Some(repo.revparse_single(rev)?.peel_to_commit()?);
    let mut records: Vec<CommitRecord> = Vec::new();
    let mut visited = 0usize;

    while let Some(commit) = current {
        if max_commits.is_some_and(|max| records.len() >= max) {
            break;
        }
        visited += 1;

        let parent = commit.parents().next();
        let after = file_content(&repo, &commit, file_path)?;
        let before = match &parent {
            Some(p) => file_content(&repo, p, file_path)?,
            None => String::new(),
        };

        if before != after {
            records.push(CommitRecord {
                id: commit.id().to_string(),
                message: commit.message().unwrap_or("").trim().to_string(),
                parent: None,
                before,
                after,
            });
        }
        current = parent;
    }

    // Oldest first, each record pointing at the previous one
    records.reverse();
    for i in 1..records.len() {
        let previous = records[i - 1].id.clone();
        records[i].parent = Some(previous);
    }

    tracing::debug!(
        "History of {:?}: {} of {} first-parent commits touch the file",
        file_path,
        records.len(),
        visited
    );
    Ok(CommitChain::new(records))
}

fn file_content(repo: &Repository, commit: &Commit<'_>, file_path: &Path) -> Result<String> {
    let tree = commit.tree()?;
    let entry = match tree.get_path(file_path) {
        Ok(entry) => entry,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(String::new()),
        Err(e) => return Err(e.into()),
    };

    let object = entry.to_object(repo)?;
    match object.as_blob() {
        Some(blob) => Ok(String::from_utf8_lossy(blob.content()).into_owned()),
        None => Ok(String::new()),
    }
}
