// Integration test for the line-matching pipeline with realistic source files
use linetrace::config::{MatchMode, MatchingConfig};
use linetrace::matching::{compare_all, FilePair, LineMatcher, LineSequence, Resolution};
use linetrace::track_lines;

const OLD_SOURCE: &str = r#"import java.util.List;

public class Cart {
    private List<Item> items;

    public int total() {
        int total = price * quantity + tax;
        return total;
    }

    public void clear() {
        items.clear();
    }
}
"#;

const NEW_SOURCE: &str = r#"import java.util.List;
import java.util.ArrayList;

public class Cart {
    private final List<Item> items = new ArrayList<>();

    public int total() {
        int total = price * quantity
            + tax;
        return total;
    }

    public void reset() {
        items.clear();
    }
}
"#;

#[test]
fn test_realistic_revision() {
    let old = LineSequence::from_content(OLD_SOURCE);
    let new = LineSequence::from_content(NEW_SOURCE);
    let (mapping, stats) = LineMatcher::new(MatchingConfig::default()).run(&old, &new);

    // Unchanged lines keep their counterparts
    assert_eq!(mapping.targets(0), &[0]);
    assert_eq!(mapping.targets(2), &[3]);
    assert_eq!(mapping.targets(7), &[9]);
    assert_eq!(mapping.targets(11), &[13]);
    assert_eq!(mapping.targets(13), &[15]);

    // Edited lines are paired with their rewritten versions
    assert_eq!(mapping.targets(3), &[4]);
    assert_eq!(mapping.resolution(3), Resolution::Matched);
    assert_eq!(mapping.targets(6).first(), Some(&7));
    assert_eq!(mapping.targets(10), &[12]);

    // New import has no source
    assert_eq!(mapping.source_of(1), None);
    assert_eq!(stats.old_lines, old.len());
    assert_eq!(
        stats.exact + stats.matched + stats.split + stats.deleted,
        old.len()
    );
}

#[test]
fn test_wrapped_call_is_split() {
    let old = "fn main() {\n    foo(alpha, beta, gamma, delta);\n}\n";
    let new = "fn main() {\n    foo(alpha, beta,\n        gamma, delta);\n}\n";
    let mapping = track_lines(old, new, &MatchingConfig::for_mode(MatchMode::Attribution));

    assert_eq!(mapping.targets(1), &[1, 2]);
    assert_eq!(mapping.resolution(1), Resolution::Split);
    assert_eq!(mapping.targets(2), &[3]);
}

#[test]
fn test_identity_on_real_file() {
    let mapping = track_lines(NEW_SOURCE, NEW_SOURCE, &MatchingConfig::default());
    for i in 0..mapping.old_len() {
        assert_eq!(mapping.targets(i), &[i]);
        assert_eq!(mapping.resolution(i), Resolution::Exact);
    }
}

#[test]
fn test_no_new_line_claimed_twice_in_any_mode() {
    for mode in [MatchMode::Tracking, MatchMode::Attribution, MatchMode::Forced] {
        let mapping = track_lines(OLD_SOURCE, NEW_SOURCE, &MatchingConfig::for_mode(mode));

        let mut claimed = vec![false; mapping.new_len()];
        for (_, entry) in mapping.iter() {
            let Some(m) = entry else { continue };
            assert!(m.new_indices.windows(2).all(|w| w[0] < w[1]));
            for &n in &m.new_indices {
                assert!(!claimed[n], "{} claimed twice in {} mode", n, mode);
                claimed[n] = true;
            }
        }
    }
}

#[test]
fn test_threshold_boundary_and_forced_mode() {
    // Empty contexts score 1.0, unrelated content 0.0: combined exactly 0.4
    let tracking = track_lines("alpha\n", "zzz\n", &MatchingConfig::for_mode(MatchMode::Tracking));
    assert!(tracking.targets(0).is_empty());

    let forced = track_lines("alpha\n", "zzz\n", &MatchingConfig::for_mode(MatchMode::Forced));
    assert_eq!(forced.targets(0), &[0]);
    assert_eq!(forced.resolution(0), Resolution::Matched);
}

#[test]
fn test_batch_matches_single_runs() {
    let pairs = vec![
        FilePair::new("cart", OLD_SOURCE, NEW_SOURCE),
        FilePair::new("same", OLD_SOURCE, OLD_SOURCE),
        FilePair::new("emptied", OLD_SOURCE, ""),
    ];
    let config = MatchingConfig::default();
    let results = compare_all(&pairs, &config);

    assert_eq!(results.len(), 3);
    assert_eq!(
        results[0].mapping,
        track_lines(OLD_SOURCE, NEW_SOURCE, &config)
    );
    assert_eq!(results[1].stats.exact, LineSequence::from_content(OLD_SOURCE).len());
    assert_eq!(results[2].stats.deleted, results[2].stats.old_lines);
}
