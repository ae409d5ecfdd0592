// Similarity scorer: weighted content (edit distance) + context (cosine)
use crate::config::MatchingConfig;
use crate::matching::types::{LineMapping, LineSequence};
use crate::matching::utils::{content_similarity, TermVector};

/// Breakdown of a pair score for transparency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    /// 1 - normalized Levenshtein distance of the two lines
    pub content: f64,
    /// Cosine similarity of the two context windows
    pub context: f64,
    /// Weighted combination used for ranking and thresholding
    pub combined: f64,
}

/// Scores (old, new) pairs for one matching run
///
/// Context vectors of unresolved lines are built once per run and dropped
/// with the scorer; nothing is shared across runs.
pub struct SimilarityScorer<'a> {
    old: &'a LineSequence,
    new: &'a LineSequence,
    window: usize,
    content_weight: f64,
    context_weight: f64,
    old_contexts: Vec<Option<TermVector>>,
    new_contexts: Vec<Option<TermVector>>,
}

impl<'a> SimilarityScorer<'a> {
    pub fn new(
        old: &'a LineSequence,
        new: &'a LineSequence,
        mapping: &LineMapping,
        config: &MatchingConfig,
    ) -> Self {
        let window = config.context_window;
        let old_contexts = (0..old.len())
            .map(|i| {
                (!mapping.is_old_resolved(i)).then(|| TermVector::from_text(&old.context(i, window)))
            })
            .collect();
        let new_contexts = (0..new.len())
            .map(|i| {
                (!mapping.is_new_resolved(i)).then(|| TermVector::from_text(&new.context(i, window)))
            })
            .collect();

        Self {
            old,
            new,
            window,
            content_weight: config.content_weight,
            context_weight: config.context_weight,
            old_contexts,
            new_contexts,
        }
    }

    pub fn score(&self, old_index: usize, new_index: usize) -> PairScore {
        let content = content_similarity(
            self.old.normalized(old_index),
            self.new.normalized(new_index),
        );
        let context = self.context_similarity(old_index, new_index);

        PairScore {
            content,
            context,
            combined: self.content_weight * content + self.context_weight * context,
        }
    }

    fn context_similarity(&self, old_index: usize, new_index: usize) -> f64 {
        let cached_old = self.old_contexts.get(old_index).and_then(Option::as_ref);
        let cached_new = self.new_contexts.get(new_index).and_then(Option::as_ref);

        match (cached_old, cached_new) {
            (Some(a), Some(b)) => a.cosine(b),
            _ => {
                let a = TermVector::from_text(&self.old.context(old_index, self.window));
                let b = TermVector::from_text(&self.new.context(new_index, self.window));
                a.cosine(&b)
            }
        }
    }
}
