//! Property tests for the scanner and the engine-level guarantees.

use proptest::prelude::*;
use srcmend::catalog::RuleCatalog;
use srcmend::engine::RuleEngine;
use srcmend::{find_matching_close, split_top_level};
use std::path::Path;

/// Arbitrary balanced brace tree rendered as text, with filler between
/// delimiters. Depth and width kept small; the scanner is O(n) anyway.
fn balanced_braces() -> impl Strategy<Value = String> {
    let leaf = "[a-z ]{0,6}";
    leaf.prop_recursive(4, 32, 4, |inner| {
        (prop::collection::vec(inner, 0..4), "[a-z ]{0,4}").prop_map(|(children, tail)| {
            let mut out = String::new();
            for child in children {
                out.push('{');
                out.push_str(&child);
                out.push('}');
            }
            out.push_str(&tail);
            out
        })
    })
}

proptest! {
    /// The scanner always returns the offset where cumulative depth first
    /// reaches zero, never an earlier inner close.
    #[test]
    fn scanner_finds_depth_zero_close(body in balanced_braces()) {
        let text = format!("{{{body}}}");
        let close = find_matching_close(&text, 0, '{', '}').unwrap();
        prop_assert_eq!(close, text.len() - 1);

        let mut depth = 0i64;
        for (offset, ch) in text.char_indices().take_while(|(o, _)| *o < close) {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            // Depth never returns to zero strictly inside the span.
            if offset > 0 {
                prop_assert!(depth > 0, "depth hit zero early at {offset}");
            }
        }
    }

    /// Stripping the final close makes the text unbalanced.
    #[test]
    fn scanner_rejects_truncated_text(body in balanced_braces()) {
        let text = format!("{{{body}");
        prop_assert!(
            find_matching_close(&text, 0, '{', '}').is_err(),
            "truncated text must be unbalanced"
        );
    }

    /// Splitting on top-level commas and re-joining reproduces the input.
    #[test]
    fn split_join_round_trips(
        segments in prop::collection::vec("[a-z ]{0,5}(\\([a-z,]{0,4}\\))?[a-z ]{0,3}", 1..6)
    ) {
        let input = segments.join(",");
        let parts = split_top_level(&input, ',').unwrap();
        let joined = parts.join(",");
        prop_assert_eq!(parts.len(), segments.len());
        prop_assert_eq!(joined, input);
    }

    /// Applying the full legacy catalog twice never changes text the
    /// second time, whatever the input.
    #[test]
    fn engine_is_idempotent_on_arbitrary_text(
        text in "[ -~\\n]{0,200}"
    ) {
        let catalog = RuleCatalog::legacy_defaults().unwrap();
        let engine = RuleEngine::new(&catalog);
        let first = engine.apply(Path::new("gen.rs"), &text);
        let second = engine.apply(Path::new("gen.rs"), &first.final_text);
        prop_assert!(!second.changed, "second pass changed:\n{:?}", second.edits);
    }

    /// Migration preserves every original argument in order.
    #[test]
    fn migration_preserves_arguments(args in prop::collection::vec("[a-z]{1,6}", 8..=8)) {
        let catalog = RuleCatalog::legacy_defaults().unwrap();
        let engine = RuleEngine::new(&catalog);
        let text = format!("Resource::new({})", args.join(", "));
        let result = engine.apply(Path::new("gen.rs"), &text);
        prop_assert!(result.changed);

        let mut at = 0usize;
        for arg in &args {
            match result.final_text[at..].find(arg.as_str()) {
                Some(pos) => at += pos + arg.len(),
                None => prop_assert!(false, "argument {arg} lost in {}", result.final_text),
            }
        }
    }
}
