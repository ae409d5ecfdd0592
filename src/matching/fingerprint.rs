// Fingerprint index: SimHash over line content and context
// Prunes the candidate space so the scorer only sees the closest new lines
use crate::matching::types::{LineMapping, LineSequence};

pub const FINGERPRINT_BITS: u32 = 64;

// Feature namespaces keep a content word and the same context word apart
const WORD_TAG: u8 = b'w';
const GRAM_TAG: u8 = b'g';
const CONTEXT_TAG: u8 = b'c';

const WORD_WEIGHT: i64 = 2;
const GRAM_WEIGHT: i64 = 2;
const CONTEXT_WEIGHT: i64 = 1;

/// 64-bit locality-sensitive fingerprint of a line and its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint of normalized line content plus its context window
    ///
    /// Features are the content's words, its character trigrams, and the
    /// context's words. Empty input yields the all-zero fingerprint.
    pub fn of_line(content: &str, context: &str) -> Self {
        let mut acc = [0i64; FINGERPRINT_BITS as usize];

        for word in content.split_whitespace() {
            accumulate(&mut acc, feature_hash(WORD_TAG, word), WORD_WEIGHT);
        }
        for gram in char_trigrams(content) {
            accumulate(&mut acc, feature_hash(GRAM_TAG, gram), GRAM_WEIGHT);
        }
        for word in context.split_whitespace() {
            accumulate(&mut acc, feature_hash(CONTEXT_TAG, word), CONTEXT_WEIGHT);
        }

        let bits = acc
            .iter()
            .enumerate()
            .filter(|(_, v)| **v > 0)
            .fold(0u64, |bits, (i, _)| bits | (1u64 << i));
        Self(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    /// Hamming distance between two fingerprints
    pub fn distance(self, other: Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

fn accumulate(acc: &mut [i64; FINGERPRINT_BITS as usize], hash: u64, weight: i64) {
    for (i, slot) in acc.iter_mut().enumerate() {
        if (hash >> i) & 1 == 1 {
            *slot += weight;
        } else {
            *slot -= weight;
        }
    }
}

/// Stable 64-bit feature hash (first eight bytes of BLAKE3)
fn feature_hash(tag: u8, feature: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[tag]);
    hasher.update(feature.as_bytes());
    let digest = hasher.finalize();

    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(buf)
}

/// Overlapping three-character windows; shorter text is a single feature
fn char_trigrams(text: &str) -> Vec<&str> {
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    if bounds.is_empty() {
        return Vec::new();
    }
    bounds.push(text.len());

    if bounds.len() <= 4 {
        return vec![text];
    }
    (0..bounds.len() - 3)
        .map(|i| &text[bounds[i]..bounds[i + 3]])
        .collect()
}

/// Ranks unresolved new lines for each unresolved old line by fingerprint
/// distance
pub struct FingerprintIndex {
    window: usize,
    /// Candidates kept per old line; `None` keeps the whole pool
    limit: Option<usize>,
}

impl FingerprintIndex {
    pub fn new(window: usize, limit: Option<usize>) -> Self {
        Self { window, limit }
    }

    pub fn fingerprint(&self, seq: &LineSequence, index: usize) -> Fingerprint {
        Fingerprint::of_line(seq.normalized(index), &seq.context(index, self.window))
    }

    /// Candidate lists for every unresolved old line
    ///
    /// Each list is ordered by ascending Hamming distance, ties by ascending
    /// new index, and truncated to the configured limit.
    ///
    /// # Returns
    /// `(old_index, candidates)` pairs in ascending old-index order
    pub fn candidates(
        &self,
        old: &LineSequence,
        new: &LineSequence,
        mapping: &LineMapping,
    ) -> Vec<(usize, Vec<usize>)> {
        let pool: Vec<(usize, Fingerprint)> = mapping
            .unresolved_new()
            .into_iter()
            .map(|n| (n, self.fingerprint(new, n)))
            .collect();

        if pool.is_empty() {
            return Vec::new();
        }

        mapping
            .unresolved_old()
            .into_iter()
            .map(|o| {
                let print = self.fingerprint(old, o);
                let mut ranked: Vec<(u32, usize)> = pool
                    .iter()
                    .map(|&(n, p)| (print.distance(p), n))
                    .collect();
                ranked.sort_unstable();
                if let Some(limit) = self.limit {
                    ranked.truncate(limit);
                }
                (o, ranked.into_iter().map(|(_, n)| n).collect())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::types::Resolution;

    #[test]
    fn test_identical_text_identical_fingerprint() {
        let a = Fingerprint::of_line("int x = 5;", "foo bar");
        let b = Fingerprint::of_line("int x = 5;", "foo bar");
        assert_eq!(a, b);
        assert_eq!(a.distance(b), 0);
    }

    #[test]
    fn test_similar_text_is_closer_than_unrelated() {
        let base = Fingerprint::of_line("total = price * quantity;", "");
        let edited = Fingerprint::of_line("total = price * quantity + tax;", "");
        let unrelated = Fingerprint::of_line("import java.util.list;", "");
        assert!(base.distance(edited) < base.distance(unrelated));
    }

    #[test]
    fn test_empty_and_huge_lines_are_total() {
        assert_eq!(Fingerprint::of_line("", "").bits(), 0);
        let huge = "token ".repeat(20_000);
        let _ = Fingerprint::of_line(&huge, &huge);
    }

    #[test]
    fn test_trigrams() {
        assert_eq!(char_trigrams(""), Vec::<&str>::new());
        assert_eq!(char_trigrams("ab"), vec!["ab"]);
        assert_eq!(char_trigrams("abc"), vec!["abc"]);
        assert_eq!(char_trigrams("abcd"), vec!["abc", "bcd"]);
        assert_eq!(char_trigrams("héllo"), vec!["hél", "éll", "llo"]);
    }

    #[test]
    fn test_candidates_only_cover_unresolved_lines() {
        let old = LineSequence::new(["keep", "changed one", "changed two"]);
        let new = LineSequence::new(["keep", "changed 1", "changed 2", "extra"]);
        let mut mapping = LineMapping::new(old.len(), new.len());
        mapping.commit(0, vec![0], Resolution::Exact, 1.0);

        let index = FingerprintIndex::new(4, Some(2));
        let candidates = index.candidates(&old, &new, &mapping);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].0, 1);
        assert_eq!(candidates[1].0, 2);
        for (_, list) in &candidates {
            assert_eq!(list.len(), 2);
            assert!(!list.contains(&0));
        }
    }

    #[test]
    fn test_candidates_ranked_by_distance_then_index() {
        let old = LineSequence::new(["let total = price * quantity;"]);
        let new = LineSequence::new([
            "import java.util.list;",
            "let total = price * quantity;",
            "fn unrelated_helper() {}",
            "let total = price * quantity;",
        ]);
        let mapping = LineMapping::new(old.len(), new.len());

        // Zero-width window: identical lines get identical fingerprints
        let index = FingerprintIndex::new(0, None);
        let list = &index.candidates(&old, &new, &mapping)[0].1;

        assert_eq!(list.len(), 4);
        assert_eq!(&list[..2], &[1, 3]);

        let target = index.fingerprint(&old, 0);
        let ranked: Vec<(u32, usize)> = list
            .iter()
            .map(|&n| (target.distance(index.fingerprint(&new, n)), n))
            .collect();
        assert_eq!(ranked[0].0, 0);
        assert!(ranked.windows(2).all(|w| w[0] < w[1]), "not ranked: {:?}", ranked);
    }

    #[test]
    fn test_limit_keeps_closest_candidates() {
        let old = LineSequence::new(["same line"]);
        let new = LineSequence::new(["something else entirely", "same line", "same line"]);
        let mapping = LineMapping::new(old.len(), new.len());

        let list = &FingerprintIndex::new(0, Some(2)).candidates(&old, &new, &mapping)[0].1;
        assert_eq!(list, &vec![1, 2]);
    }

    #[test]
    fn test_widened_pool_keeps_everything() {
        let old = LineSequence::new(["a"]);
        let new = LineSequence::new(["b", "c", "d", "e"]);
        let mapping = LineMapping::new(old.len(), new.len());

        let index = FingerprintIndex::new(4, None);
        let candidates = index.candidates(&old, &new, &mapping);
        let mut list = candidates[0].1.clone();
        list.sort_unstable();
        assert_eq!(list, vec![0, 1, 2, 3]);
    }
}
