// Text helpers shared by the matching stages
use ahash::{HashMap, HashMapExt};

/// Canonical form of a line: lower-cased, trimmed, whitespace runs collapsed
/// to a single space
pub fn normalize_line(line: &str) -> String {
    line.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Classic Levenshtein distance over characters
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // Common prefix and suffix never contribute edits
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let (a, b) = (&a[prefix..], &b[prefix..]);
    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    // Keep the DP row as short as possible
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr: Vec<usize> = vec![0; short.len() + 1];
    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let cost = usize::from(lc != sc);
            curr[j + 1] = (curr[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

/// 1 - levenshtein / max(len), in [0, 1]; two empty strings are identical
pub fn content_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
}

/// Term-frequency vector over whitespace-delimited tokens
#[derive(Debug, Clone, Default)]
pub struct TermVector {
    counts: HashMap<String, u32>,
    norm: f64,
}

impl TermVector {
    pub fn from_text(text: &str) -> Self {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for token in text.split_whitespace() {
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
        let norm = counts
            .values()
            .map(|&c| (c as f64) * (c as f64))
            .sum::<f64>()
            .sqrt();
        Self { counts, norm }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Cosine similarity; two empty vectors are identical, an empty and a
    /// non-empty vector share nothing
    pub fn cosine(&self, other: &TermVector) -> f64 {
        match (self.is_empty(), other.is_empty()) {
            (true, true) => return 1.0,
            (true, false) | (false, true) => return 0.0,
            _ => {}
        }

        let (small, large) = if self.counts.len() <= other.counts.len() {
            (self, other)
        } else {
            (other, self)
        };
        let dot: f64 = small
            .counts
            .iter()
            .filter_map(|(token, &c)| large.counts.get(token).map(|&d| c as f64 * d as f64))
            .sum();

        dot / (self.norm * other.norm)
    }
}

/// Cosine similarity of two texts as term-frequency vectors
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    TermVector::from_text(a).cosine(&TermVector::from_text(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_line("  Int  X =\t5; "), "int x = 5;");
        assert_eq!(normalize_line(""), "");
        assert_eq!(normalize_line(" \t "), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize_line("  Return   FOO(a,  b);  ");
        assert_eq!(normalize_line(&once), once);
    }

    #[test]
    fn test_levenshtein_known_values() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
    }

    #[test]
    fn test_levenshtein_counts_chars_not_bytes() {
        assert_eq!(levenshtein_distance("héllo", "hello"), 1);
    }

    #[test]
    fn test_levenshtein_long_input() {
        let a = "x".repeat(5000);
        let b = format!("{}y", "x".repeat(4999));
        assert_eq!(levenshtein_distance(&a, &b), 1);
    }

    #[test]
    fn test_content_similarity_bounds() {
        assert_eq!(content_similarity("", ""), 1.0);
        assert_eq!(content_similarity("abc", "abc"), 1.0);
        assert_eq!(content_similarity("abc", "xyz"), 0.0);
        assert_eq!(content_similarity("abc", ""), 0.0);

        let sim = content_similarity("return a+1;", "return a+2;");
        assert!(sim > 0.9 && sim < 1.0);
    }

    #[test]
    fn test_cosine_empty_conventions() {
        assert_eq!(cosine_similarity("", ""), 1.0);
        assert_eq!(cosine_similarity("a b", ""), 0.0);
        assert_eq!(cosine_similarity("", "a b"), 0.0);
    }

    #[test]
    fn test_cosine_term_frequency() {
        assert!((cosine_similarity("a b c", "c b a") - 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity("a b", "c d"), 0.0);

        // [2,1] . [1,1] / (sqrt(5) * sqrt(2))
        let expected = 3.0 / (5.0_f64.sqrt() * 2.0_f64.sqrt());
        assert!((cosine_similarity("a a b", "a b") - expected).abs() < 1e-9);
    }
}
