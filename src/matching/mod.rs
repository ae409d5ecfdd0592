// Multi-stage line matching between two revisions of a file
//
// Stage 1: Exact-match alignment (Myers over normalized lines)
// Stage 2: Fingerprint candidate pruning (SimHash, top-K by Hamming distance)
// Stage 3: Similarity scoring + greedy one-to-one matching
// Stage 4: Line split detection for the remaining old lines
//
// Each stage only sees the residue left unresolved by the previous one.

mod batch;
mod exact;
mod fingerprint;
mod greedy;
mod scorer;
mod split;
mod types;
pub mod utils;

pub use batch::{compare_all, load_manifest, BatchResult, FilePair, ManifestEntry};
pub use exact::{removed_lines, ExactAligner};
pub use fingerprint::{Fingerprint, FingerprintIndex, FINGERPRINT_BITS};
pub use greedy::GreedyMatcher;
pub use scorer::{PairScore, SimilarityScorer};
pub use split::{best_prefix, SplitDetector};
pub use types::{
    CandidatePair, LineMapping, LineMatch, LineSequence, MappedLine, MatchStats, Resolution,
};

use crate::config::MatchingConfig;
use std::time::Instant;

/// Line matching pipeline orchestrator
///
/// Holds only configuration; every call to [`LineMatcher::run`] owns its own
/// run state, so one matcher can serve many comparisons (and threads).
#[derive(Debug, Clone)]
pub struct LineMatcher {
    config: MatchingConfig,
}

impl LineMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Run all stages and return the mapping with run statistics
    pub fn run(&self, old: &LineSequence, new: &LineSequence) -> (LineMapping, MatchStats) {
        let start = Instant::now();

        let mut run = MatchRun::new(old, new, &self.config);
        run.align_exact();
        run.match_candidates();
        run.detect_splits();

        let (mapping, mut stats) = run.finish();
        stats.processing_time_ms = start.elapsed().as_millis() as u64;
        (mapping, stats)
    }

    /// Mapping only
    pub fn track(&self, old: &LineSequence, new: &LineSequence) -> LineMapping {
        self.run(old, new).0
    }
}

/// Compare two file contents with the given configuration
pub fn track_lines(old_content: &str, new_content: &str, config: &MatchingConfig) -> LineMapping {
    LineMatcher::new(config.clone()).track(
        &LineSequence::from_content(old_content),
        &LineSequence::from_content(new_content),
    )
}

/// State of one comparison, advanced one stage at a time
///
/// Stages must be called in order; a caller may stop between stages and
/// [`MatchRun::finish`] with a partial (but consistent) mapping.
pub struct MatchRun<'a> {
    old: &'a LineSequence,
    new: &'a LineSequence,
    config: &'a MatchingConfig,
    mapping: LineMapping,
    stats: MatchStats,
}

impl<'a> MatchRun<'a> {
    pub fn new(old: &'a LineSequence, new: &'a LineSequence, config: &'a MatchingConfig) -> Self {
        Self {
            old,
            new,
            config,
            mapping: LineMapping::new(old.len(), new.len()),
            stats: MatchStats {
                old_lines: old.len(),
                new_lines: new.len(),
                ..MatchStats::default()
            },
        }
    }

    pub fn mapping(&self) -> &LineMapping {
        &self.mapping
    }

    /// Stage 1: commit identical normalized runs
    pub fn align_exact(&mut self) -> usize {
        let resolved = ExactAligner::new().align(self.old, self.new, &mut self.mapping);
        self.stats.exact = resolved;
        tracing::debug!(
            "exact: {} of {} old lines aligned",
            resolved,
            self.old.len()
        );
        resolved
    }

    /// Stages 2 and 3: fingerprint pruning, scoring, greedy commit
    pub fn match_candidates(&mut self) -> usize {
        let limit = if self.config.widened_pool {
            None
        } else {
            Some(self.config.candidate_limit)
        };
        let index = FingerprintIndex::new(self.config.context_window, limit);
        let candidates = index.candidates(self.old, self.new, &self.mapping);
        if candidates.is_empty() {
            return 0;
        }

        let scorer = SimilarityScorer::new(self.old, self.new, &self.mapping, self.config);
        let matcher = GreedyMatcher::new(self.config.match_threshold);

        let best = matcher.best_pairs(&candidates, &scorer, &self.mapping);
        let ranked = matcher.rank(best);
        self.stats.candidate_pairs = ranked.len();

        let committed = matcher.commit(&ranked, &mut self.mapping);
        tracing::debug!(
            "greedy: {} of {} candidate pairs committed (threshold {})",
            committed.len(),
            ranked.len(),
            self.config.match_threshold
        );
        committed.len()
    }

    /// Stage 4: one-to-many split mappings
    pub fn detect_splits(&mut self) -> usize {
        let resolved =
            SplitDetector::new(self.config.split_threshold).detect(self.old, self.new, &mut self.mapping);
        tracing::debug!("split: {} old lines resolved from line runs", resolved);
        resolved
    }

    pub fn finish(self) -> (LineMapping, MatchStats) {
        let mut stats = self.stats;
        // One-line runs from the split stage count as matches
        stats.matched = self.mapping.count(Resolution::Matched);
        stats.split = self.mapping.count(Resolution::Split);
        stats.deleted = self.mapping.count(Resolution::Deleted);
        stats.added = self.mapping.unresolved_new().len();
        (self.mapping, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchMode;

    fn seq(lines: &[&str]) -> LineSequence {
        LineSequence::new(lines.iter().copied())
    }

    #[test]
    fn test_identity_law() {
        let lines = seq(&[
            "public class Foo {",
            "    int x = 0;",
            "",
            "    int x = 0;",
            "}",
        ]);
        let (mapping, stats) = LineMatcher::new(MatchingConfig::default()).run(&lines, &lines);

        for i in 0..lines.len() {
            assert_eq!(mapping.targets(i), &[i]);
        }
        assert_eq!(stats.exact, lines.len());
        assert_eq!(stats.matched + stats.split + stats.deleted + stats.added, 0);
    }

    #[test]
    fn test_pure_insertion() {
        let mapping = LineMatcher::new(MatchingConfig::default())
            .track(&seq(&["a", "b"]), &seq(&["a", "x", "b"]));
        assert_eq!(mapping.targets(0), &[0]);
        assert_eq!(mapping.targets(1), &[2]);
        assert_eq!(mapping.source_of(1), None);
    }

    #[test]
    fn test_pure_deletion() {
        let mapping = LineMatcher::new(MatchingConfig::default())
            .track(&seq(&["a", "b", "c"]), &seq(&["a", "c"]));
        let map = mapping.to_index_map();
        assert_eq!(map[&0], vec![0]);
        assert_eq!(map[&1], Vec::<usize>::new());
        assert_eq!(map[&2], vec![1]);
    }

    #[test]
    fn test_modified_line_matched() {
        let old = seq(&["fn a() {", "    let total = price * qty;", "}"]);
        let new = seq(&["fn a() {", "    let total = price * quantity;", "}"]);
        let (mapping, stats) = LineMatcher::new(MatchingConfig::default()).run(&old, &new);

        assert_eq!(mapping.targets(1), &[1]);
        assert_eq!(mapping.resolution(1), Resolution::Matched);
        assert_eq!(stats.matched, 1);
    }

    #[test]
    fn test_empty_inputs() {
        let matcher = LineMatcher::new(MatchingConfig::default());

        let (mapping, stats) = matcher.run(&seq(&["a", "b"]), &seq(&[]));
        assert_eq!(stats.deleted, 2);
        assert!(mapping.targets(0).is_empty());

        let (mapping, stats) = matcher.run(&seq(&[]), &seq(&["a", "b"]));
        assert_eq!(mapping.old_len(), 0);
        assert_eq!(stats.added, 2);
    }

    #[test]
    fn test_stages_resolve_each_line_once() {
        let old = seq(&["alpha", "beta gamma", "delta", "one two three four"]);
        let new = seq(&["alpha", "beta  gamma!", "epsilon", "one two", "three four"]);
        let config = MatchingConfig::for_mode(MatchMode::Attribution);

        let mut run = MatchRun::new(&old, &new, &config);
        run.align_exact();
        let after_exact: Vec<bool> = (0..old.len()).map(|i| run.mapping().is_old_resolved(i)).collect();
        run.match_candidates();
        run.detect_splits();
        let (mapping, _) = run.finish();

        for (i, was_exact) in after_exact.iter().enumerate() {
            if *was_exact {
                assert_eq!(mapping.resolution(i), Resolution::Exact);
            }
        }

        let mut seen = std::collections::HashSet::new();
        for (_, entry) in mapping.iter() {
            if let Some(m) = entry {
                for n in &m.new_indices {
                    assert!(seen.insert(*n), "new line {} claimed twice", n);
                }
            }
        }
    }

    #[test]
    fn test_single_line_fallback_counts_as_match() {
        // Context differs too much for the greedy stage at 0.75
        let old = seq(&["int a = 1;", "first", "second"]);
        let new = seq(&["int a = 2;", "other", "lines"]);
        let (mapping, stats) =
            LineMatcher::new(MatchingConfig::for_mode(MatchMode::Attribution)).run(&old, &new);

        assert_eq!(mapping.targets(0), &[0]);
        assert_eq!(mapping.resolution(0), Resolution::Matched);
        assert_eq!(stats.split, mapping.count(Resolution::Split));
        assert_eq!(stats.matched, mapping.count(Resolution::Matched));
        assert_eq!(stats.exact + stats.matched + stats.split + stats.deleted, old.len());
    }

    #[test]
    fn test_track_lines_from_content() {
        let mapping = track_lines("x\ny\n", "x\nz\ny\n", &MatchingConfig::default());
        assert_eq!(mapping.targets(0), &[0]);
        assert_eq!(mapping.targets(1), &[2]);
    }
}
