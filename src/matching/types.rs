// Shared types for the line-matching pipeline
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::matching::utils::normalize_line;

/// Ordered lines of one file revision with their normalized forms cached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSequence {
    lines: Vec<String>,
    normalized: Vec<String>,
}

impl LineSequence {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        let normalized = lines.iter().map(|l| normalize_line(l)).collect();
        Self { lines, normalized }
    }

    /// Split file content on line terminators (`\n` or `\r\n`)
    pub fn from_content(content: &str) -> Self {
        Self::new(content.lines())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn raw(&self, index: usize) -> &str {
        &self.lines[index]
    }

    pub fn normalized(&self, index: usize) -> &str {
        &self.normalized[index]
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn normalized_lines(&self) -> &[String] {
        &self.normalized
    }

    /// Normalized lines within `window` positions of `index`, excluding the
    /// line itself, joined with single spaces
    pub fn context(&self, index: usize, window: usize) -> String {
        let start = index.saturating_sub(window);
        let end = index.saturating_add(window).saturating_add(1).min(self.len());

        let mut context = String::new();
        for i in (start..end).filter(|&i| i != index) {
            let line = &self.normalized[i];
            if line.is_empty() {
                continue;
            }
            if !context.is_empty() {
                context.push(' ');
            }
            context.push_str(line);
        }
        context
    }
}

/// Stage that committed a mapping entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Identical normalized run found by the sequence alignment
    Exact,
    /// One-to-one pair accepted by the greedy matcher
    Matched,
    /// One old line spread over consecutive new lines
    Split,
    /// No counterpart found in the new revision
    Deleted,
}

/// Committed mapping for one old line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineMatch {
    /// Ordered new-line indices (one for exact/matched, one or more for split)
    pub new_indices: Vec<usize>,
    pub resolution: Resolution,
    /// Similarity that justified the mapping (1.0 for exact runs)
    pub score: f64,
}

/// Scored (old, new) candidate produced by the similarity scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePair {
    pub old_index: usize,
    pub new_index: usize,
    pub score: f64,
}

/// Mapping from old-line index to new-line indices
///
/// Entries are write-once: after a stage commits an old line, no later stage
/// may overwrite it, and every new line belongs to at most one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMapping {
    entries: Vec<Option<LineMatch>>,
    new_owner: Vec<Option<usize>>,
}

impl LineMapping {
    pub fn new(old_len: usize, new_len: usize) -> Self {
        Self {
            entries: vec![None; old_len],
            new_owner: vec![None; new_len],
        }
    }

    pub fn old_len(&self) -> usize {
        self.entries.len()
    }

    pub fn new_len(&self) -> usize {
        self.new_owner.len()
    }

    pub fn is_old_resolved(&self, old_index: usize) -> bool {
        matches!(self.entries.get(old_index), Some(Some(_)))
    }

    pub fn is_new_resolved(&self, new_index: usize) -> bool {
        matches!(self.new_owner.get(new_index), Some(Some(_)))
    }

    /// Commit a mapping entry
    ///
    /// Returns false and leaves the mapping untouched when the old line is
    /// already resolved, when `new_indices` is empty or not strictly
    /// ascending, or when any new line is out of range or already claimed.
    pub fn commit(
        &mut self,
        old_index: usize,
        new_indices: Vec<usize>,
        resolution: Resolution,
        score: f64,
    ) -> bool {
        if old_index >= self.entries.len() || self.is_old_resolved(old_index) {
            return false;
        }
        if new_indices.is_empty() || resolution == Resolution::Deleted {
            return false;
        }
        if new_indices.windows(2).any(|w| w[0] >= w[1]) {
            return false;
        }
        if new_indices
            .iter()
            .any(|&n| n >= self.new_owner.len() || self.is_new_resolved(n))
        {
            return false;
        }

        for &n in &new_indices {
            self.new_owner[n] = Some(old_index);
        }
        self.entries[old_index] = Some(LineMatch {
            new_indices,
            resolution,
            score,
        });
        true
    }

    pub fn get(&self, old_index: usize) -> Option<&LineMatch> {
        self.entries.get(old_index).and_then(Option::as_ref)
    }

    /// New-line indices for an old line (empty when deleted)
    pub fn targets(&self, old_index: usize) -> &[usize] {
        self.get(old_index)
            .map(|m| m.new_indices.as_slice())
            .unwrap_or(&[])
    }

    pub fn resolution(&self, old_index: usize) -> Resolution {
        self.get(old_index)
            .map(|m| m.resolution)
            .unwrap_or(Resolution::Deleted)
    }

    /// Old line that a new line was mapped from, if any
    pub fn source_of(&self, new_index: usize) -> Option<usize> {
        self.new_owner.get(new_index).copied().flatten()
    }

    pub fn unresolved_old(&self) -> Vec<usize> {
        (0..self.entries.len())
            .filter(|&i| !self.is_old_resolved(i))
            .collect()
    }

    pub fn unresolved_new(&self) -> Vec<usize> {
        (0..self.new_owner.len())
            .filter(|&i| !self.is_new_resolved(i))
            .collect()
    }

    /// Number of old lines in the given terminal state
    pub fn count(&self, resolution: Resolution) -> usize {
        (0..self.entries.len())
            .filter(|&i| self.resolution(i) == resolution)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&LineMatch>)> + '_ {
        self.entries.iter().enumerate().map(|(i, m)| (i, m.as_ref()))
    }

    /// Inverse mapping new index -> old index for every claimed new line
    pub fn inverse(&self) -> BTreeMap<usize, usize> {
        self.new_owner
            .iter()
            .enumerate()
            .filter_map(|(n, owner)| owner.map(|o| (n, o)))
            .collect()
    }

    /// Total map over old indices; deleted lines map to an empty list
    pub fn to_index_map(&self) -> BTreeMap<usize, Vec<usize>> {
        (0..self.entries.len())
            .map(|i| (i, self.targets(i).to_vec()))
            .collect()
    }

    /// Serializable per-line view of the mapping
    pub fn report(&self) -> Vec<MappedLine> {
        self.iter()
            .map(|(old, entry)| match entry {
                Some(m) => MappedLine {
                    old,
                    new: m.new_indices.clone(),
                    resolution: m.resolution,
                    score: Some(m.score),
                },
                None => MappedLine {
                    old,
                    new: Vec::new(),
                    resolution: Resolution::Deleted,
                    score: None,
                },
            })
            .collect()
    }
}

/// One row of a mapping report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedLine {
    pub old: usize,
    pub new: Vec<usize>,
    pub resolution: Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Statistics from one matching run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchStats {
    pub old_lines: usize,
    pub new_lines: usize,
    /// Old lines resolved by the exact-match aligner
    pub exact: usize,
    /// Old lines resolved one-to-one by similarity
    pub matched: usize,
    /// Old lines mapped to a run of two or more new lines
    pub split: usize,
    /// Old lines left without a counterpart
    pub deleted: usize,
    /// New lines no old line maps to
    pub added: usize,
    /// Best-candidate pairs that passed the match threshold
    pub candidate_pairs: usize,
    pub processing_time_ms: u64,
}
