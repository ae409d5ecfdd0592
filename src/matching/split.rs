// Split detector: one old line rewritten as several consecutive new lines
use crate::matching::types::{LineMapping, LineSequence, Resolution};
use crate::matching::utils::content_similarity;

pub struct SplitDetector {
    threshold: f64,
}

impl SplitDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Try a split mapping for every old line still unresolved
    ///
    /// Each old line (ascending) grows a run from the lowest unresolved new
    /// line over consecutive unresolved new lines and stops at the first
    /// extension that does not improve similarity. A best prefix of one line
    /// is an ordinary one-to-one match and is committed as `Matched`; only
    /// runs of two or more lines are `Split`.
    ///
    /// # Returns
    /// Number of old lines resolved by this stage
    pub fn detect(&self, old: &LineSequence, new: &LineSequence, mapping: &mut LineMapping) -> usize {
        let mut resolved = 0;

        for o in mapping.unresolved_old() {
            let Some(start) = (0..new.len()).find(|&n| !mapping.is_new_resolved(n)) else {
                break;
            };

            let run_end = (start..new.len())
                .take_while(|&n| !mapping.is_new_resolved(n))
                .last()
                .map_or(start + 1, |n| n + 1);
            let run: Vec<&str> = (start..run_end).map(|n| new.normalized(n)).collect();

            let (similarity, len) = best_prefix(old.normalized(o), &run);
            if similarity >= self.threshold {
                let indices: Vec<usize> = (start..start + len).collect();
                let resolution = if len > 1 {
                    Resolution::Split
                } else {
                    Resolution::Matched
                };
                if mapping.commit(o, indices, resolution, similarity) {
                    resolved += 1;
                }
            }
        }
        resolved
    }
}

/// Grow a concatenation of `run` lines until similarity to `target` stops
/// improving
///
/// # Returns
/// (best similarity, number of lines in the best prefix); `run` must be
/// non-empty for the prefix length to be meaningful
pub fn best_prefix(target: &str, run: &[&str]) -> (f64, usize) {
    let mut combined = String::new();
    let mut best = (f64::NEG_INFINITY, 0);

    for (i, line) in run.iter().enumerate() {
        combined.push_str(line);
        let similarity = content_similarity(target, &combined);
        if similarity > best.0 {
            best = (similarity, i + 1);
        } else {
            break;
        }
    }
    best
}
