//! srcmend: batch source repair for known structural defects
//!
//! A rule-driven rewrite engine for fixing a fixed catalog of defect
//! shapes left behind by earlier automated edits: definitions accidentally
//! nested inside other definitions, and constructor calls stuck at an old
//! argument arity after the type grew fields.
//!
//! # Architecture
//!
//! The engine is a pure text-to-text transformation. Matching is built on
//! a depth-counting [delimiter scanner](scan::find_matching_close) rather
//! than regex alternation, because the defects themselves are nested
//! shapes that a single-pass pattern cannot delimit correctly. Each
//! [`rule::Rule`] pairs a recognizer with a rewriter; the
//! [`engine::RuleEngine`] applies the ordered catalog and the
//! idempotence [`guard`] rejects any rewrite its own rule would match
//! again.
//!
//! # Safety
//!
//! - Re-applying the engine to repaired text is a no-op
//! - Caller-supplied arguments are never altered or reordered
//! - Rejected edits and scanner failures are reported, never silent
//! - Atomic file writes (tempfile + fsync + rename), with a content hash
//!   guarding against files changing mid-batch
//!
//! # Example
//!
//! ```
//! use srcmend::catalog::RuleCatalog;
//! use srcmend::engine::RuleEngine;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = RuleCatalog::legacy_defaults()?;
//! let engine = RuleEngine::new(&catalog);
//!
//! let result = engine.apply(Path::new("mock.rs"), "Resource::new(a, b, c, d, e, f, g, h)");
//! assert!(result.changed);
//!
//! let again = engine.apply(Path::new("mock.rs"), &result.final_text);
//! assert!(!again.changed);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod catalog;
pub mod engine;
pub mod guard;
pub mod report;
pub mod rule;
pub mod scan;

// Re-exports
pub use batch::{BatchError, BatchOutcome, BatchRunner, FileReport};
pub use catalog::{load_from_path, load_from_str, load_many, CatalogError, RuleCatalog};
pub use engine::RuleEngine;
pub use report::{BatchSummary, FileResult};
pub use rule::{Edit, Region, RejectReason, Rule, RuleKind, RuleMatch};
pub use scan::{find_matching_close, split_top_level, ScanError};
