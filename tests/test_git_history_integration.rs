// End-to-end: git history -> commit chain -> blame and SZZ
use git2::{Commit, Repository, Signature};
use linetrace::attribution::BugIdentifier;
use linetrace::blame::BlameTracer;
use linetrace::config::Config;
use linetrace::history::load_file_history;
use std::path::Path;
use tempfile::TempDir;

fn commit(repo: &Repository, dir: &Path, name: &str, content: &str, message: &str) -> String {
    std::fs::write(dir.join(name), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
        .to_string()
}

fn build_repo() -> (TempDir, Vec<String>) {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();

    let ids = vec![
        commit(&repo, dir.path(), "calc.py", "def area(w, h):\n    return w * h\n", "Initial version"),
        commit(&repo, dir.path(), "README", "calc\n", "Add readme"),
        commit(
            &repo,
            dir.path(),
            "calc.py",
            "def area(w, h):\n    if w < 0:\n        w = 0\n    return w * h\n",
            "Add clamp for negative width",
        ),
        commit(
            &repo,
            dir.path(),
            "calc.py",
            "def area(w, h):\n    if w < 0:\n        raise ValueError(w)\n    return w * h\n",
            "Fix silent clamping bug",
        ),
    ];
    (dir, ids)
}

#[test]
fn test_blame_over_git_history() {
    let (dir, ids) = build_repo();
    let chain = load_file_history(dir.path(), Path::new("calc.py"), "HEAD", None).unwrap();

    // README commit does not touch the file
    assert_eq!(chain.len(), 3);
    let head = chain.head().unwrap().id.clone();
    assert_eq!(head, ids[3]);

    let report = BlameTracer::new(Config::default().blame_matching())
        .trace(&chain, &head, &[0, 1])
        .unwrap();

    assert_eq!(report.origin_of(0).and_then(|o| o.commit()), Some(ids[0].as_str()));
    assert_eq!(report.origin_of(1).and_then(|o| o.commit()), Some(ids[2].as_str()));
}

#[test]
fn test_szz_over_git_history() {
    let (dir, ids) = build_repo();
    let chain = load_file_history(dir.path(), Path::new("calc.py"), "HEAD", None).unwrap();
    let config = Config::default();

    let report = BugIdentifier::new(config.blame_matching(), &config.attribution)
        .unwrap()
        .identify(&chain)
        .unwrap();

    assert_eq!(report.fixes.len(), 1);
    assert_eq!(report.fixes[0].commit, ids[3]);
    assert_eq!(report.fixes[0].removed_lines, vec![2]);
    assert!(report.bug_inducing.contains(&ids[2]));
    assert!(!report.bug_inducing.contains(&ids[0]));
}
