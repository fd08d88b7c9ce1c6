//! Rule catalog: the ordered, immutable set of rules for a run.
//!
//! Loaded once at startup from TOML, validated, compiled, then shared
//! read-only across workers for the whole batch.

pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, load_many, CatalogError};
pub use schema::{CatalogConfig, Metadata, ValidationError, ValidationIssue};

use crate::rule::{ArityForm, ArityMigrationRule, Insertion, NestedDefinitionRule, Rule, RuleKind};
use schema::{FormDefinition, ShapeDefinition, ValidationIssue as Issue};

/// The canonical repairs for the historically observed defect classes,
/// shipped as data. Used when no catalog file is supplied.
const LEGACY_CATALOG: &str = r#"
[meta]
name = "legacy-repairs"
description = "Canonical repairs for defects left by earlier automated edits"

[[rules]]
id = "split-nested-definition"
kind = "nested-definition"
header = 'fn\s+(?P<name>\w+)\s*\([^)]*\)\s*->\s*[^{;]+'

[[rules]]
id = "resource-new-arity"
kind = "arity-migration"
callee = "Resource::new"
form = "call"
old_arity = 8

[[rules.insert]]
index = 4
token = "ResourceScope::Company"

[[rules.insert]]
index = 4
token = "None"

[[rules.insert]]
index = 8
token = "None"

[[rules]]
id = "resource-available-new-arity"
kind = "arity-migration"
callee = "Resource::<Available>::new"
form = "call"
old_arity = 8

[[rules.insert]]
index = 4
token = "ResourceScope::Company"

[[rules.insert]]
index = 4
token = "None"

[[rules.insert]]
index = 8
token = "None"

[[rules]]
id = "resource-available-literal-fields"
kind = "arity-migration"
callee = "Resource::<Available>"
form = "struct-literal"
old_arity = 13

[[rules.insert]]
index = 0
token = "project_id: None"

[[rules.insert]]
index = 0
token = "scope: ResourceScope::Company"
"#;

#[derive(Debug, Clone)]
pub struct RuleCatalog {
    pub meta: Metadata,
    rules: Vec<Rule>,
}

impl RuleCatalog {
    /// Compile a validated configuration into executable rules.
    ///
    /// Regex compilation is itself a validation step, so a pattern that
    /// fails here surfaces as a `ValidationError` like any other issue.
    pub fn compile(config: CatalogConfig) -> Result<Self, ValidationError> {
        let mut rules = Vec::with_capacity(config.rules.len());
        let mut issues = Vec::new();

        for definition in config.rules {
            let kind = match definition.shape {
                ShapeDefinition::NestedDefinition { header } => {
                    match regex::Regex::new(&header) {
                        Ok(header) => {
                            RuleKind::NestedDefinition(NestedDefinitionRule { header })
                        }
                        Err(error) => {
                            issues.push(Issue::Invalid {
                                rule_id: Some(definition.id),
                                message: format!("header pattern does not compile: {error}"),
                            });
                            continue;
                        }
                    }
                }
                ShapeDefinition::ArityMigration {
                    callee,
                    form,
                    old_arity,
                    insertions,
                } => {
                    let mut insertions: Vec<Insertion> = insertions
                        .into_iter()
                        .map(|ins| Insertion {
                            index: ins.index,
                            token: ins.token,
                        })
                        .collect();
                    // Ascending order keeps later insertions' indices valid
                    // against the original capture list; the sort is stable,
                    // so equal indices keep their catalog order.
                    insertions.sort_by_key(|ins| ins.index);
                    RuleKind::ArityMigration(ArityMigrationRule {
                        callee,
                        form: match form {
                            FormDefinition::Call => ArityForm::Call,
                            FormDefinition::StructLiteral => ArityForm::StructLiteral,
                        },
                        old_arity,
                        insertions,
                    })
                }
            };

            rules.push(Rule {
                id: definition.id,
                kind,
            });
        }

        if issues.is_empty() {
            Ok(Self {
                meta: config.meta,
                rules,
            })
        } else {
            Err(ValidationError { issues })
        }
    }

    /// The shipped default catalog. Infallible by construction; covered
    /// by a test so a bad edit to the embedded TOML cannot slip through.
    pub fn legacy_defaults() -> Result<Self, CatalogError> {
        load_from_str(LEGACY_CATALOG)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
