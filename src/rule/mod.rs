//! Rule abstraction: a named recognizer/rewriter pair.
//!
//! A rule knows how to detect one defect shape in text and how to produce
//! the repaired replacement for it. Rules are data-driven: everything a
//! rule needs (anchor pattern, delimiter form, insertion table) comes from
//! the catalog, so new defect classes are new catalog entries, not engine
//! changes.

pub mod arity;
pub mod nested;

use crate::scan::ScanError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

pub use arity::{ArityForm, ArityMigrationRule, Insertion};
pub use nested::NestedDefinitionRule;

/// A balanced span of the source text.
///
/// Invariant: `start < end`, and `text` is the exact substring at
/// `[start, end)` with equal nesting of the rule's delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Region {
    pub fn new(source: &str, start: usize, end: usize) -> Self {
        debug_assert!(start < end);
        Self {
            start,
            end,
            text: source[start..end].to_string(),
        }
    }
}

/// One recognized occurrence of a rule's defect shape.
///
/// `captures` maps the rule's fixed field names (for example `outer_name`
/// or `arg3`) to the exact substrings extracted for this occurrence.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    pub rule_id: String,
    pub region: Region,
    pub captures: HashMap<String, String>,
}

impl RuleMatch {
    /// Look up a capture the rewriter requires.
    pub fn require(&self, field: &str) -> Result<&str, RejectReason> {
        self.captures
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| RejectReason::MissingCapture(field.to_string()))
    }
}

/// Why a candidate edit was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    /// The replacement would immediately re-match its own rule.
    WouldRetrigger,
    /// The rewriter needed a capture the recognizer did not populate.
    MissingCapture(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::WouldRetrigger => write!(f, "would re-trigger rule"),
            RejectReason::MissingCapture(field) => {
                write!(f, "recognizer did not populate capture '{field}'")
            }
        }
    }
}

/// A proposed (and possibly rejected) rewrite of one region.
#[derive(Debug, Clone, Serialize)]
pub struct Edit {
    pub rule_id: String,
    pub region: Region,
    pub replacement: String,
    pub accepted: bool,
    pub reject_reason: Option<RejectReason>,
}

/// A scanner failure on a specific candidate, surfaced instead of a
/// partial rewrite. Contained to the occurrence; never fatal.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub rule_id: String,
    pub offset: usize,
    pub message: String,
}

/// Outcome of probing one anchor occurrence.
#[derive(Debug)]
pub enum Candidate {
    /// The defect shape is present here.
    Match(RuleMatch),
    /// The anchor matched but the shape does not hold; scanning continues
    /// after `resume_at`.
    NotHere { resume_at: usize },
    /// The scanner could not extract a balanced region.
    Broken { offset: usize, error: ScanError },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub kind: RuleKind,
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    NestedDefinition(NestedDefinitionRule),
    ArityMigration(ArityMigrationRule),
}

impl Rule {
    /// Search for the next occurrence of this rule's defect shape at or
    /// after `from`. Returns `None` when no anchor remains.
    pub fn find_next(&self, text: &str, from: usize) -> Option<Candidate> {
        match &self.kind {
            RuleKind::NestedDefinition(rule) => rule.find_next(&self.id, text, from),
            RuleKind::ArityMigration(rule) => rule.find_next(&self.id, text, from),
        }
    }

    /// Produce the replacement text for a recognized occurrence.
    pub fn rewrite(&self, found: &RuleMatch) -> Result<String, RejectReason> {
        match &self.kind {
            RuleKind::NestedDefinition(rule) => rule.rewrite(found),
            RuleKind::ArityMigration(rule) => rule.rewrite(found),
        }
    }

    /// Whether the recognizer matches anywhere in `text`. Used by the
    /// idempotence guard against proposed replacements.
    pub fn matches_anywhere(&self, text: &str) -> bool {
        let mut pos = 0usize;
        while pos <= text.len() {
            match self.find_next(text, pos) {
                Some(Candidate::Match(_)) => return true,
                Some(Candidate::NotHere { resume_at }) => pos = resume_at.max(pos + 1),
                Some(Candidate::Broken { offset, .. }) => pos = offset.max(pos) + 1,
                None => return false,
            }
        }
        false
    }
}
