//! Per-file and per-batch result types consumed by the reporter.
//!
//! A `FileResult` lives for one run of the engine over one file and is
//! discarded after reporting; nothing here persists between runs.

use crate::rule::{Diagnostic, Edit};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of applying the full catalog to one file's text.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub original_text: String,
    pub final_text: String,
    /// Every edit considered, accepted or rejected, in application order.
    pub edits: Vec<Edit>,
    /// Scanner failures on individual candidates.
    pub diagnostics: Vec<Diagnostic>,
    pub changed: bool,
}

impl FileResult {
    pub fn accepted_edits(&self) -> usize {
        self.edits.iter().filter(|e| e.accepted).count()
    }

    pub fn rejected_edits(&self) -> usize {
        self.edits.len() - self.accepted_edits()
    }

    /// A conflict is anything a human should look at: a rejected edit or a
    /// scanner diagnostic.
    pub fn has_conflicts(&self) -> bool {
        self.rejected_edits() > 0 || !self.diagnostics.is_empty()
    }
}

/// Aggregated counts for a whole batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub fixed: usize,
    pub unchanged: usize,
    pub conflicts: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn record(&mut self, result: &FileResult) {
        if result.changed {
            self.fixed += 1;
        } else {
            self.unchanged += 1;
        }
        if result.has_conflicts() {
            self.conflicts += 1;
        }
    }

    /// Exit status encoding: bit 0 = something changed (or would change),
    /// bit 1 = conflicts or errors were recorded. 0 means clean and
    /// untouched.
    pub fn exit_code(&self) -> i32 {
        let mut code = 0;
        if self.fixed > 0 {
            code |= 1;
        }
        if self.conflicts > 0 || self.errors > 0 {
            code |= 2;
        }
        code
    }
}
