//! Raw catalog configuration as deserialized from TOML, plus validation.
//!
//! The catalog is data, not code: a rule is fully described by its anchor
//! pattern, delimiter form, arity and insertion table, so new defect
//! classes are new entries here, never engine changes.

use crate::scan::split_top_level;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CatalogConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleDefinition {
    pub id: String,
    #[serde(flatten)]
    pub shape: ShapeDefinition,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ShapeDefinition {
    NestedDefinition {
        /// Regex for a definition header; must bind a `name` capture.
        header: String,
    },
    ArityMigration {
        /// Literal callee text preceding the argument list.
        callee: String,
        #[serde(default)]
        form: FormDefinition,
        old_arity: usize,
        #[serde(default, rename = "insert")]
        insertions: Vec<InsertionDefinition>,
    },
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FormDefinition {
    #[default]
    Call,
    StructLiteral,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct InsertionDefinition {
    pub index: usize,
    pub token: String,
}

impl CatalogConfig {
    /// Structural validation. Every file would be processed against a
    /// broken catalog, so any issue here is fatal before the run starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen_ids: HashSet<&str> = HashSet::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            } else if !seen_ids.insert(rule.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId {
                    rule_id: rule.id.clone(),
                });
            }

            match &rule.shape {
                ShapeDefinition::NestedDefinition { header } => {
                    if header.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id: Some(rule.id.clone()),
                            field: "header",
                        });
                        continue;
                    }
                    match regex::Regex::new(header) {
                        Ok(compiled) => {
                            let has_name = compiled
                                .capture_names()
                                .any(|name| name == Some("name"));
                            if !has_name {
                                issues.push(ValidationIssue::Invalid {
                                    rule_id: Some(rule.id.clone()),
                                    message: "header pattern must bind a `name` capture group"
                                        .to_string(),
                                });
                            }
                        }
                        Err(error) => {
                            issues.push(ValidationIssue::Invalid {
                                rule_id: Some(rule.id.clone()),
                                message: format!("header pattern does not compile: {error}"),
                            });
                        }
                    }
                }
                ShapeDefinition::ArityMigration {
                    callee,
                    old_arity,
                    insertions,
                    ..
                } => {
                    if callee.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id: Some(rule.id.clone()),
                            field: "callee",
                        });
                    }
                    if *old_arity == 0 {
                        issues.push(ValidationIssue::Invalid {
                            rule_id: Some(rule.id.clone()),
                            message: "old_arity must be at least 1".to_string(),
                        });
                    }
                    if insertions.is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            rule_id: Some(rule.id.clone()),
                            field: "insert",
                        });
                    }
                    for insertion in insertions {
                        if insertion.index > *old_arity {
                            issues.push(ValidationIssue::Invalid {
                                rule_id: Some(rule.id.clone()),
                                message: format!(
                                    "insertion index {} out of range for old arity {}",
                                    insertion.index, old_arity
                                ),
                            });
                        }
                        if insertion.token.trim().is_empty() {
                            issues.push(ValidationIssue::MissingField {
                                rule_id: Some(rule.id.clone()),
                                field: "insert.token",
                            });
                        } else {
                            // A token carrying a top-level comma would change
                            // the argument count the guard relies on.
                            match split_top_level(&insertion.token, ',') {
                                Ok(parts) if parts.len() == 1 => {}
                                _ => issues.push(ValidationIssue::Invalid {
                                    rule_id: Some(rule.id.clone()),
                                    message: format!(
                                        "insertion token `{}` must be a single balanced argument",
                                        insertion.token
                                    ),
                                }),
                            }
                        }
                    }
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        rule_id: String,
    },
    Invalid {
        rule_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "catalog contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "rule missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { rule_id } => {
                write!(f, "duplicate rule id '{rule_id}'")
            }
            ValidationIssue::Invalid { rule_id, message } => match rule_id {
                Some(id) => write!(f, "rule '{id}' is invalid: {message}"),
                None => write!(f, "invalid rule: {message}"),
            },
        }
    }
}
