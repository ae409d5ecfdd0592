// Commit history for one file, linearized along first parents
pub mod git;

use ahash::{HashMap, HashMapExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LinetraceError, Result};
use crate::matching::LineSequence;

pub use git::load_file_history;

/// One commit touching the tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: String,
    #[serde(default, alias = "msg")]
    pub message: String,
    /// Linear predecessor; `None` for the root of the history
    #[serde(default, alias = "parent_id")]
    pub parent: Option<String>,
    /// File content before the commit (pre-image)
    #[serde(default, alias = "file_prev")]
    pub before: String,
    /// File content after the commit (post-image)
    #[serde(default, alias = "file_curr")]
    pub after: String,
}

impl CommitRecord {
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        parent: Option<&str>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            parent: parent.map(str::to_string),
            before: before.into(),
            after: after.into(),
        }
    }

    pub fn before_lines(&self) -> LineSequence {
        LineSequence::from_content(&self.before)
    }

    pub fn after_lines(&self) -> LineSequence {
        LineSequence::from_content(&self.after)
    }
}

/// Lookup of commits by id
pub trait CommitProvider {
    fn commit(&self, id: &str) -> Option<&CommitRecord>;
}

/// In-memory commit history, oldest first
#[derive(Debug, Clone, Default)]
pub struct CommitChain {
    commits: Vec<CommitRecord>,
    index: HashMap<String, usize>,
}

impl CommitChain {
    /// Build a chain; a later record with a duplicate id shadows the earlier one
    pub fn new(commits: Vec<CommitRecord>) -> Self {
        let mut index = HashMap::with_capacity(commits.len());
        for (i, commit) in commits.iter().enumerate() {
            if index.insert(commit.id.clone(), i).is_some() {
                tracing::warn!("Duplicate commit id in history: {}", commit.id);
            }
        }
        Self { commits, index }
    }

    /// Parse a JSON array of commit records
    pub fn from_json(json: &str) -> Result<Self> {
        let commits: Vec<CommitRecord> =
            serde_json::from_str(json).map_err(|e| LinetraceError::Json {
                source: e,
                context: "Failed to parse commit history".to_string(),
            })?;
        Ok(Self::new(commits))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LinetraceError::Io {
            source: e,
            context: format!("Failed to read history file: {:?}", path),
        })?;
        let chain = Self::from_json(&content)?;
        tracing::debug!("Loaded {} commits from {:?}", chain.len(), path);
        Ok(chain)
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CommitRecord> {
        self.index.get(id).map(|&i| &self.commits[i])
    }

    /// Most recent commit
    pub fn head(&self) -> Option<&CommitRecord> {
        self.commits.last()
    }
}

impl CommitProvider for CommitChain {
    fn commit(&self, id: &str) -> Option<&CommitRecord> {
        self.get(id)
    }
}
