//! Rule engine: applies an ordered catalog of rules to one file's text.
//!
//! Rules run in catalog order. Each rule's anchors are searched
//! left-to-right against the *current* text, so a later rule observes
//! earlier rules' edits and an earlier rule may expose or remove a later
//! rule's anchor. Accepted replacements are spliced immediately and the
//! scan resumes past the replacement, which is what makes stale
//! overlapping candidates impossible: every candidate is computed against
//! post-edit text.

use crate::catalog::RuleCatalog;
use crate::guard;
use crate::report::FileResult;
use crate::rule::{Candidate, Diagnostic, Edit};
use std::path::Path;

pub struct RuleEngine<'c> {
    catalog: &'c RuleCatalog,
}

impl<'c> RuleEngine<'c> {
    pub fn new(catalog: &'c RuleCatalog) -> Self {
        Self { catalog }
    }

    /// Apply every rule in catalog order; returns the edited text plus a
    /// structured record of every edit considered and every scanner
    /// diagnostic. Per-occurrence failures never abort the file.
    pub fn apply(&self, path: &Path, text: &str) -> FileResult {
        let original = text.to_string();
        let mut current = text.to_string();
        let mut edits: Vec<Edit> = Vec::new();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        for rule in self.catalog.rules() {
            let mut pos = 0usize;
            while pos <= current.len() {
                let candidate = match rule.find_next(&current, pos) {
                    Some(candidate) => candidate,
                    None => break,
                };

                match candidate {
                    Candidate::NotHere { resume_at } => {
                        pos = resume_at.max(pos + 1);
                    }
                    Candidate::Broken { offset, error } => {
                        diagnostics.push(Diagnostic {
                            rule_id: rule.id.clone(),
                            offset,
                            message: error.to_string(),
                        });
                        pos = offset.max(pos) + 1;
                    }
                    Candidate::Match(found) => {
                        let region = found.region.clone();
                        let (replacement, verdict) = match rule.rewrite(&found) {
                            Ok(replacement) => {
                                let verdict = guard::accept(rule, &replacement).err();
                                (replacement, verdict)
                            }
                            Err(reason) => (String::new(), Some(reason)),
                        };

                        let accepted = verdict.is_none();
                        if accepted {
                            current.replace_range(region.start..region.end, &replacement);
                            pos = region.start + replacement.len();
                        } else {
                            pos = region.end;
                        }

                        edits.push(Edit {
                            rule_id: rule.id.clone(),
                            region,
                            replacement,
                            accepted,
                            reject_reason: verdict,
                        });
                    }
                }
            }
        }

        let changed = current != original;
        FileResult {
            path: path.to_path_buf(),
            original_text: original,
            final_text: current,
            edits,
            diagnostics,
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_from_str;
    use std::path::PathBuf;

    const CATALOG: &str = r#"
[meta]
name = "test-catalog"

[[rules]]
id = "split-nested-fn"
kind = "nested-definition"
header = 'fn\s+(?P<name>\w+)\s*\([^)]*\)[^{;]*'

[[rules]]
id = "pair-arity"
kind = "arity-migration"
callee = "Pair::new"
form = "call"
old_arity = 2

[[rules.insert]]
index = 2
token = "None"
"#;

    fn engine_fixture() -> RuleCatalog {
        load_from_str(CATALOG).unwrap()
    }

    fn apply(text: &str) -> FileResult {
        let catalog = engine_fixture();
        let engine = RuleEngine::new(&catalog);
        engine.apply(&PathBuf::from("test.rs"), text)
    }

    #[test]
    fn non_matching_text_is_untouched() {
        let text = "fn clean() -> u32 {\n    42\n}\n";
        let result = apply(text);
        assert!(!result.changed);
        assert_eq!(result.final_text, text);
        assert!(result.edits.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn applies_both_rules_in_order() {
        let text = "\
fn outer() -> u32 {
    fn inner() -> u32 {
        1
    }
        2
}
let p = Pair::new(a, b);
";
        let result = apply(text);
        assert!(result.changed);
        assert_eq!(result.accepted_edits(), 2);
        assert!(result.final_text.contains("Pair::new(a, b, None)"));
        // Sibling definitions at the same indentation.
        let outer_at = result.final_text.find("fn outer").unwrap();
        let inner_at = result.final_text.find("fn inner").unwrap();
        assert!(outer_at < inner_at);
        assert!(result.final_text.contains("}\nfn inner"));
    }

    #[test]
    fn second_application_is_a_no_op() {
        let text = "\
fn outer() -> u32 {
    fn inner() -> u32 {
        1
    }
        2
}
let p = Pair::new(a, b);
";
        let first = apply(text);
        assert!(first.changed);
        let second = apply(&first.final_text);
        assert!(!second.changed, "second pass edited: {:?}", second.edits);
        assert_eq!(second.accepted_edits(), 0);
    }

    #[test]
    fn unbalanced_candidate_becomes_a_diagnostic() {
        let text = "let p = Pair::new(a, b";
        let result = apply(text);
        assert!(!result.changed);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].rule_id, "pair-arity");
        assert!(result.diagnostics[0].message.contains("unbalanced"));
    }

    #[test]
    fn multiple_occurrences_fixed_left_to_right() {
        let text = "Pair::new(a, b); Pair::new(c, d);";
        let result = apply(text);
        assert_eq!(result.accepted_edits(), 2);
        assert_eq!(
            result.final_text,
            "Pair::new(a, b, None); Pair::new(c, d, None);"
        );
    }

    #[test]
    fn self_retriggering_edit_is_rejected_and_recorded() {
        // An old-arity call nested inside another old-arity call of the
        // same callee: the outer rewrite still contains the inner
        // occurrence, so the guard rejects it instead of double-patching.
        let text = "Pair::new(Pair::new(a, b), c);";
        let result = apply(text);
        assert!(!result.changed);
        assert_eq!(result.accepted_edits(), 0);
        assert_eq!(result.rejected_edits(), 1);
        assert_eq!(
            result.edits[0].reject_reason,
            Some(crate::rule::RejectReason::WouldRetrigger)
        );
        // Re-applying reports the same conflict but never mutates.
        let second = apply(&result.final_text);
        assert!(!second.changed);
        assert_eq!(second.accepted_edits(), 0);
    }
}
