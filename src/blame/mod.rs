// Historical blame tracer
//
// Walks a linear commit history backwards from a starting commit. At every
// commit the line-matching pipeline maps the pre-image onto the post-image;
// a target line that has no pre-image counterpart was introduced by that
// commit, every other target moves to its pre-image position and the walk
// continues at the parent.

use ahash::{HashSet, HashSetExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::MatchingConfig;
use crate::error::{LinetraceError, Result};
use crate::history::CommitProvider;
use crate::matching::LineMatcher;

/// Where a traced line came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineOrigin {
    /// The commit whose post-image first contains the line, and the line's
    /// position in that post-image
    Introduced { commit: String, position: usize },
    /// History ran out (root with a non-empty pre-image, unknown parent,
    /// revisited commit or depth bound) while the line was still tracked
    Unknown {
        last_commit: String,
        position: usize,
    },
}

impl LineOrigin {
    pub fn commit(&self) -> Option<&str> {
        match self {
            LineOrigin::Introduced { commit, .. } => Some(commit),
            LineOrigin::Unknown { .. } => None,
        }
    }
}

/// A target line and its resolved origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracedLine {
    /// Position in the starting commit's post-image
    pub position: usize,
    pub origin: LineOrigin,
}

/// One visited commit of a blame walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameStep {
    pub commit: String,
    /// Targets still tracked when the commit was visited
    pub active_before: usize,
    /// Targets whose origin is this commit
    pub originated: usize,
    /// Targets carried on to the parent
    pub active_after: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameReport {
    /// One entry per distinct target, ascending by position
    pub lines: Vec<TracedLine>,
    pub steps: Vec<BlameStep>,
}

impl BlameReport {
    /// Commits that introduced at least one target line
    pub fn bug_inducing_commits(&self) -> BTreeSet<String> {
        self.lines
            .iter()
            .filter_map(|l| l.origin.commit().map(str::to_string))
            .collect()
    }

    pub fn unknown(&self) -> Vec<usize> {
        self.lines
            .iter()
            .filter(|l| matches!(l.origin, LineOrigin::Unknown { .. }))
            .map(|l| l.position)
            .collect()
    }

    pub fn origin_of(&self, position: usize) -> Option<&LineOrigin> {
        self.lines
            .iter()
            .find(|l| l.position == position)
            .map(|l| &l.origin)
    }
}

/// Tracks a line as (position at the start commit, position now)
#[derive(Debug, Clone, Copy)]
struct ActiveLine {
    initial: usize,
    current: usize,
}

pub struct BlameTracer {
    matcher: LineMatcher,
    max_depth: Option<usize>,
}

impl BlameTracer {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            matcher: LineMatcher::new(config),
            max_depth: None,
        }
    }

    /// Visit at most `depth` commits
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Trace target lines of `start`'s post-image back to their origins
    ///
    /// # Arguments
    /// * `provider` - Commit lookup
    /// * `start` - Id of the commit whose post-image holds the targets
    /// * `targets` - 0-based line positions in that post-image
    ///
    /// # Returns
    /// One origin per distinct target; `Err(CommitNotFound)` only when
    /// `start` itself is unknown
    pub fn trace<P: CommitProvider + ?Sized>(
        &self,
        provider: &P,
        start: &str,
        targets: &[usize],
    ) -> Result<BlameReport> {
        let first = provider
            .commit(start)
            .ok_or_else(|| LinetraceError::CommitNotFound {
                id: start.to_string(),
            })?;

        let mut report = BlameReport::default();
        let start_len = first.after_lines().len();
        let requested: BTreeSet<usize> = targets.iter().copied().collect();

        let mut active: Vec<ActiveLine> = Vec::with_capacity(requested.len());
        for &position in &requested {
            if position < start_len {
                active.push(ActiveLine {
                    initial: position,
                    current: position,
                });
            } else {
                tracing::warn!(
                    "Line {} is outside commit {} ({} lines)",
                    position,
                    start,
                    start_len
                );
                report.lines.push(TracedLine {
                    position,
                    origin: LineOrigin::Unknown {
                        last_commit: start.to_string(),
                        position,
                    },
                });
            }
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut next_id = Some(start.to_string());
        let mut last_commit = start.to_string();

        while let Some(id) = next_id.take() {
            if active.is_empty() {
                break;
            }
            if self.max_depth.is_some_and(|max| visited.len() >= max) {
                tracing::debug!("Blame depth bound reached at {}", id);
                break;
            }
            let Some(commit) = provider.commit(&id) else {
                tracing::debug!("Parent commit {} not in history", id);
                break;
            };
            if !visited.insert(id.clone()) {
                tracing::warn!("Commit {} revisited, history has a cycle", id);
                break;
            }
            last_commit = id.clone();

            let mapping = self
                .matcher
                .track(&commit.before_lines(), &commit.after_lines());

            let active_before = active.len();
            let mut carried = Vec::with_capacity(active.len());
            for line in active.drain(..) {
                match mapping.source_of(line.current) {
                    Some(old) => carried.push(ActiveLine {
                        initial: line.initial,
                        current: old,
                    }),
                    None => {
                        tracing::info!(
                            "Line {} originates in commit {} (position {})",
                            line.initial,
                            commit.id,
                            line.current
                        );
                        report.lines.push(TracedLine {
                            position: line.initial,
                            origin: LineOrigin::Introduced {
                                commit: commit.id.clone(),
                                position: line.current,
                            },
                        });
                    }
                }
            }
            active = carried;

            report.steps.push(BlameStep {
                commit: commit.id.clone(),
                active_before,
                originated: active_before - active.len(),
                active_after: active.len(),
            });
            next_id = commit.parent.clone();
        }

        for line in active {
            report.lines.push(TracedLine {
                position: line.initial,
                origin: LineOrigin::Unknown {
                    last_commit: last_commit.clone(),
                    position: line.current,
                },
            });
        }

        report.lines.sort_by_key(|l| l.position);
        Ok(report)
    }
}
