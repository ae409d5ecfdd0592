// Exact-match aligner: sequence alignment over normalized lines
// Equal runs are committed 1:1 and never revisited by later stages
use similar::{Algorithm, ChangeTag, TextDiff};

use crate::matching::types::{LineMapping, LineSequence, Resolution};

/// Commits identical runs found by a Myers alignment of the two normalized
/// sequences
pub struct ExactAligner {
    algorithm: Algorithm,
}

impl ExactAligner {
    pub fn new() -> Self {
        Self {
            algorithm: Algorithm::Myers,
        }
    }

    /// Align `old` against `new` and commit every line of every equal run
    ///
    /// # Returns
    /// Number of old lines resolved by this stage
    pub fn align(&self, old: &LineSequence, new: &LineSequence, mapping: &mut LineMapping) -> usize {
        let mut resolved = 0;
        for (o, n) in diff_map_lines(self.algorithm, old.normalized_lines(), new.normalized_lines()) {
            if mapping.commit(o, vec![n], Resolution::Exact, 1.0) {
                resolved += 1;
            }
        }
        resolved
    }
}

impl Default for ExactAligner {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk a line diff and pair up indices of equal lines
///
/// # Returns
/// `(old_index, new_index)` pairs of `Equal` changes plus the old indices of
/// `Delete` changes
fn walk_diff(algorithm: Algorithm, old: &[String], new: &[String]) -> (Vec<(usize, usize)>, Vec<usize>) {
    let old: Vec<&str> = old.iter().map(String::as_str).collect();
    let new: Vec<&str> = new.iter().map(String::as_str).collect();
    let diff = TextDiff::configure().algorithm(algorithm).diff_slices(&old, &new);

    let mut equal = Vec::new();
    let mut deleted = Vec::new();
    let mut old_idx = 0usize;
    let mut new_idx = 0usize;

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => {
                equal.push((old_idx, new_idx));
                old_idx += 1;
                new_idx += 1;
            }
            ChangeTag::Delete => {
                deleted.push(old_idx);
                old_idx += 1;
            }
            ChangeTag::Insert => {
                new_idx += 1;
            }
        }
    }
    (equal, deleted)
}

fn diff_map_lines(algorithm: Algorithm, old: &[String], new: &[String]) -> Vec<(usize, usize)> {
    walk_diff(algorithm, old, new).0
}

/// Old-line indices that a line diff reports as removed (deleted or
/// replaced)
pub fn removed_lines(old: &[String], new: &[String]) -> Vec<usize> {
    walk_diff(Algorithm::Myers, old, new).1
}
