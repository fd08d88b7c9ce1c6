//! Idempotence guard: a rewrite is only committed if its own rule can no
//! longer recognize the replacement text. A re-match means the rewrite
//! would be patched again on the next run (or loop forever inside this
//! one), so the edit is rejected and the original text kept.

use crate::rule::{RejectReason, Rule};

/// Accept or reject a proposed replacement for `rule`.
///
/// Rejection is a correctness signal, not an internal detail: callers
/// record it on the `FileResult` so a human sees the conflict.
pub fn accept(rule: &Rule, replacement: &str) -> Result<(), RejectReason> {
    if rule.matches_anywhere(replacement) {
        Err(RejectReason::WouldRetrigger)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{ArityForm, ArityMigrationRule, Insertion, Rule, RuleKind};

    fn arity_rule(insertions: Vec<Insertion>) -> Rule {
        Rule {
            id: "guarded".to_string(),
            kind: RuleKind::ArityMigration(ArityMigrationRule {
                callee: "Pair::new".to_string(),
                form: ArityForm::Call,
                old_arity: 2,
                insertions,
            }),
        }
    }

    #[test]
    fn accepts_replacement_the_rule_no_longer_matches() {
        let rule = arity_rule(vec![Insertion {
            index: 2,
            token: "None".to_string(),
        }]);
        assert!(accept(&rule, "Pair::new(a, b, None)").is_ok());
    }

    #[test]
    fn rejects_replacement_that_would_retrigger() {
        let rule = arity_rule(vec![Insertion {
            index: 2,
            token: "None".to_string(),
        }]);
        // A replacement still at the old arity re-matches immediately.
        assert_eq!(
            accept(&rule, "Pair::new(a, b)").unwrap_err(),
            RejectReason::WouldRetrigger
        );
    }
}
