// Greedy matcher: one best candidate per old line, then a global
// score-ordered pass that commits pairs while both sides are still free
use crate::matching::scorer::SimilarityScorer;
use crate::matching::types::{CandidatePair, LineMapping, Resolution};

pub struct GreedyMatcher {
    threshold: f64,
}

impl GreedyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Whether a score clears the threshold
    ///
    /// A threshold of 0.0 (or below) accepts every pair.
    pub fn passes(&self, score: f64) -> bool {
        self.threshold <= 0.0 || score > self.threshold
    }

    /// Best-scoring candidate for each old line
    ///
    /// Ties on score go to the lowest new index. Candidates whose new line is
    /// already resolved are skipped.
    pub fn best_pairs(
        &self,
        candidates: &[(usize, Vec<usize>)],
        scorer: &SimilarityScorer<'_>,
        mapping: &LineMapping,
    ) -> Vec<CandidatePair> {
        candidates
            .iter()
            .filter(|(old, _)| !mapping.is_old_resolved(*old))
            .filter_map(|(old, list)| {
                list.iter()
                    .filter(|&&n| !mapping.is_new_resolved(n))
                    .map(|&n| CandidatePair {
                        old_index: *old,
                        new_index: n,
                        score: scorer.score(*old, n).combined,
                    })
                    .reduce(|best, pair| {
                        let better = pair.score > best.score
                            || (pair.score == best.score && pair.new_index < best.new_index);
                        if better {
                            pair
                        } else {
                            best
                        }
                    })
            })
            .collect()
    }

    /// Drop pairs that do not clear the threshold and order the rest by
    /// descending score (ties: ascending old index, then new index)
    pub fn rank(&self, pairs: Vec<CandidatePair>) -> Vec<CandidatePair> {
        let mut ranked: Vec<CandidatePair> =
            pairs.into_iter().filter(|p| self.passes(p.score)).collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.old_index.cmp(&b.old_index))
                .then_with(|| a.new_index.cmp(&b.new_index))
        });
        ranked
    }

    /// Commit ranked pairs greedily
    ///
    /// # Returns
    /// The pairs that were committed, in commit order
    pub fn commit(&self, ranked: &[CandidatePair], mapping: &mut LineMapping) -> Vec<CandidatePair> {
        ranked
            .iter()
            .filter(|p| mapping.commit(p.old_index, vec![p.new_index], Resolution::Matched, p.score))
            .copied()
            .collect()
    }
}
