//! Arity-migration rule: a constructor call or struct literal whose type
//! grew new fields. Callers still passing the old fixed argument count get
//! default tokens spliced in at configured positions; every caller-supplied
//! argument keeps its exact text and relative order.

use super::{Candidate, Region, RejectReason, RuleMatch};
use crate::scan::{find_matching_close, split_top_level};
use std::collections::HashMap;

const HEAD: &str = "head";
const TRAILING_SEPARATOR: &str = "trailing_separator";

/// Which delimiter pair encloses the argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityForm {
    /// `Type::ctor(args)`
    Call,
    /// `Type { fields }`
    StructLiteral,
}

impl ArityForm {
    pub fn delimiters(self) -> (char, char) {
        match self {
            ArityForm::Call => ('(', ')'),
            ArityForm::StructLiteral => ('{', '}'),
        }
    }
}

/// A default token inserted before original position `index`
/// (`index == old_arity` appends after the last original argument).
/// Several insertions may share an index; they land adjacent, in
/// catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub index: usize,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct ArityMigrationRule {
    /// Literal callee text, e.g. `Resource::new` or `Resource::<Available>`.
    pub callee: String,
    pub form: ArityForm,
    /// Argument count identifying the pre-migration shape.
    pub old_arity: usize,
    /// Sorted ascending by index at catalog load.
    pub insertions: Vec<Insertion>,
}

impl ArityMigrationRule {
    pub fn find_next(&self, rule_id: &str, text: &str, from: usize) -> Option<Candidate> {
        let (open_char, close_char) = self.form.delimiters();
        let mut search = from;

        loop {
            let rel = text.get(search..)?.find(&self.callee)?;
            let callee_start = search + rel;
            let callee_end = callee_start + self.callee.len();
            search = callee_end;

            // A longer identifier ending in the callee is a different name.
            if text[..callee_start]
                .chars()
                .next_back()
                .is_some_and(|ch| ch.is_alphanumeric() || ch == '_')
            {
                continue;
            }

            // The argument list must open right after the callee (whitespace
            // allowed), otherwise this occurrence is a bare mention.
            let open = match first_non_ws(text, callee_end) {
                Some((offset, ch)) if ch == open_char => offset,
                _ => continue,
            };

            let close = match find_matching_close(text, open, open_char, close_char) {
                Ok(close) => close,
                Err(error) => {
                    return Some(Candidate::Broken {
                        offset: open,
                        error,
                    })
                }
            };

            let inner = &text[open + 1..close];
            let mut segments = match split_top_level(inner, ',') {
                Ok(segments) => segments,
                Err(error) => {
                    return Some(Candidate::Broken {
                        offset: open + 1,
                        error,
                    })
                }
            };

            // Tolerate and preserve a trailing comma.
            let mut trailing = "";
            if segments.len() > 1 && segments.last().is_some_and(|s| s.trim().is_empty()) {
                trailing = segments.pop().expect("checked non-empty");
            }
            if segments.len() == 1 && segments[0].trim().is_empty() {
                segments.clear();
            }

            if segments.len() != self.old_arity {
                // Already migrated (or some other shape); not this defect.
                return Some(Candidate::NotHere {
                    resume_at: callee_end,
                });
            }

            let mut captures = HashMap::new();
            captures.insert(HEAD.to_string(), text[callee_start..=open].to_string());
            captures.insert(
                TRAILING_SEPARATOR.to_string(),
                if trailing.is_empty() {
                    String::new()
                } else {
                    format!(",{trailing}")
                },
            );
            for (idx, segment) in segments.iter().enumerate() {
                captures.insert(format!("arg{idx}"), (*segment).to_string());
            }

            return Some(Candidate::Match(RuleMatch {
                rule_id: rule_id.to_string(),
                region: Region::new(text, callee_start, close + 1),
                captures,
            }));
        }
    }

    /// Re-emit the original arguments untouched, with default tokens
    /// spliced in at the configured positions.
    pub fn rewrite(&self, found: &RuleMatch) -> Result<String, RejectReason> {
        let head = found.require(HEAD)?;
        let trailing = found.require(TRAILING_SEPARATOR)?;
        let (_, close_char) = self.form.delimiters();

        let mut slots: Vec<String> = Vec::with_capacity(self.old_arity + self.insertions.len());
        let mut pending = self.insertions.iter().peekable();
        for idx in 0..self.old_arity {
            while pending.peek().is_some_and(|ins| ins.index == idx) {
                let ins = pending.next().expect("peeked above");
                slots.push(spaced(&ins.token, slots.is_empty()));
            }
            slots.push(found.require(&format!("arg{idx}"))?.to_string());
        }
        for ins in pending {
            slots.push(spaced(&ins.token, slots.is_empty()));
        }

        let mut out = String::with_capacity(head.len() + 16);
        out.push_str(head);
        out.push_str(&slots.join(","));
        out.push_str(trailing);
        out.push(close_char);
        Ok(out)
    }
}

fn spaced(token: &str, first: bool) -> String {
    if first {
        token.to_string()
    } else {
        format!(" {token}")
    }
}

fn first_non_ws(text: &str, from: usize) -> Option<(usize, char)> {
    text[from..]
        .char_indices()
        .find(|(_, ch)| !ch.is_whitespace())
        .map(|(rel, ch)| (from + rel, ch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Candidate;

    fn resource_rule() -> ArityMigrationRule {
        ArityMigrationRule {
            callee: "Resource::new".to_string(),
            form: ArityForm::Call,
            old_arity: 8,
            insertions: vec![
                Insertion {
                    index: 4,
                    token: "ResourceScope::Company".to_string(),
                },
                Insertion {
                    index: 4,
                    token: "None".to_string(),
                },
                Insertion {
                    index: 8,
                    token: "None".to_string(),
                },
            ],
        }
    }

    fn must_match(rule: &ArityMigrationRule, text: &str) -> RuleMatch {
        match rule.find_next("arity", text, 0) {
            Some(Candidate::Match(found)) => found,
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn recognizes_old_arity_call() {
        let rule = resource_rule();
        let text = "let r = Resource::new(a, b, c, d, e, f, g, h);";
        let found = must_match(&rule, text);
        assert_eq!(found.captures["arg0"], "a");
        assert_eq!(found.captures["arg7"], " h");
        assert_eq!(found.region.text, "Resource::new(a, b, c, d, e, f, g, h)");
    }

    #[test]
    fn rewrite_inserts_defaults_preserving_originals() {
        let rule = resource_rule();
        let text = "Resource::new(a, b, c, d, e, f, g, h)";
        let found = must_match(&rule, text);
        let out = rule.rewrite(&found).unwrap();
        assert_eq!(
            out,
            "Resource::new(a, b, c, d, ResourceScope::Company, None, e, f, g, h, None)"
        );
    }

    #[test]
    fn same_index_defaults_land_adjacent_in_catalog_order() {
        let rule = resource_rule();
        let text = "Resource::new(a, b, c, d, e, f, g, h)";
        let found = must_match(&rule, text);
        let out = rule.rewrite(&found).unwrap();
        // Both index-4 defaults go before the original fifth argument,
        // keeping their relative order; neither drifts between originals.
        assert!(out.contains("d, ResourceScope::Company, None, e"));
        assert!(!out.contains("e, None"));
    }

    #[test]
    fn original_argument_order_survives_migration() {
        let rule = resource_rule();
        let text = "Resource::new(a, b, c, d, e, f, g, h)";
        let found = must_match(&rule, text);
        let out = rule.rewrite(&found).unwrap();
        // Every original argument appears, in order, after migration.
        let mut at = 0usize;
        for arg in ["a", "b", "c", "d", "e", "f", "g", "h"] {
            let pos = out[at..].find(arg).unwrap_or_else(|| panic!("{arg} lost"));
            at += pos + arg.len();
        }
        // Old arity plus one slot per insertion.
        assert_eq!(out.matches(',').count() + 1, 11);
    }

    #[test]
    fn multiline_call_keeps_argument_text_verbatim() {
        let rule = resource_rule();
        let text = "Resource::new(\n    code,\n    name(x, y),\n    c,\n    d,\n    e,\n    f,\n    g,\n    h,\n)";
        let found = must_match(&rule, text);
        assert_eq!(found.captures["arg1"], "\n    name(x, y)");
        let out = rule.rewrite(&found).unwrap();
        assert!(out.contains("\n    name(x, y),"));
        assert!(out.ends_with(",\n)"));
    }

    #[test]
    fn migrated_call_no_longer_matches() {
        let rule = resource_rule();
        let text = "Resource::new(a, b, c, d, ResourceScope::Company, None, e, f, g, h, None)";
        match rule.find_next("arity", text, 0) {
            Some(Candidate::NotHere { .. }) | None => {}
            other => panic!("expected no match, got {other:?}"),
        }
    }

    #[test]
    fn longer_identifier_is_a_different_callee() {
        let rule = resource_rule();
        let text = "MockResource::new(a, b, c, d, e, f, g, h)";
        assert!(matches!(
            rule.find_next("arity", text, 0),
            Some(Candidate::NotHere { .. }) | None
        ));
    }

    #[test]
    fn qualified_path_still_matches() {
        let rule = resource_rule();
        let text = "domain::Resource::new(a, b, c, d, e, f, g, h)";
        let found = must_match(&rule, text);
        assert_eq!(found.region.start, text.find("Resource").unwrap());
    }

    #[test]
    fn struct_literal_form_uses_braces() {
        let rule = ArityMigrationRule {
            callee: "Point".to_string(),
            form: ArityForm::StructLiteral,
            old_arity: 2,
            insertions: vec![Insertion {
                index: 2,
                token: "z: 0".to_string(),
            }],
        };
        let text = "let p = Point { x: 1, y: 2 };";
        let found = must_match(&rule, text);
        let out = rule.rewrite(&found).unwrap();
        // Original field text is verbatim, so `y: 2 ` keeps its spacing.
        assert_eq!(out, "Point { x: 1, y: 2 , z: 0}");
    }

    #[test]
    fn unbalanced_argument_list_is_surfaced() {
        let rule = resource_rule();
        let text = "Resource::new(a, b, c";
        assert!(matches!(
            rule.find_next("arity", text, 0),
            Some(Candidate::Broken { .. })
        ));
    }
}
