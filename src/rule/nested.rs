//! Nested-definition rule: a definition body that accidentally contains a
//! second, complete, differently-named definition. The repair splits the
//! two into siblings, keeping whatever remains of the outer body.

use super::{Candidate, Region, RejectReason, RuleMatch};
use crate::scan::find_matching_close;
use regex::Regex;
use std::collections::HashMap;

/// Capture keys populated by the recognizer.
const OUTER_NAME: &str = "outer_name";
const OUTER_SIGNATURE: &str = "outer_signature";
const INNER_DEFINITION: &str = "inner_definition";
const OUTER_REMAINING_BODY: &str = "outer_remaining_body";
const INDENT: &str = "indent";
const INNER_INDENT: &str = "inner_indent";

#[derive(Debug, Clone)]
pub struct NestedDefinitionRule {
    /// Definition header pattern. Must carry a named capture `name`; the
    /// same pattern recognizes both the outer header and the nested one.
    pub header: Regex,
}

impl NestedDefinitionRule {
    pub fn find_next(&self, rule_id: &str, text: &str, from: usize) -> Option<Candidate> {
        let caps = self.header.captures_at(text, from)?;
        let anchor = caps.get(0).expect("group 0 always present");
        let outer_name = match caps.name("name") {
            Some(name) => name.as_str().to_string(),
            None => {
                // Pattern matched without binding `name` (alternation arm
                // without the group); not a usable candidate.
                return Some(Candidate::NotHere {
                    resume_at: anchor.end(),
                });
            }
        };

        // The body opens at the first `{` after the header. A `;` first
        // means a bodyless declaration (trait method), not a candidate.
        let open = match body_open(text, anchor.end()) {
            Some(open) => open,
            None => {
                return Some(Candidate::NotHere {
                    resume_at: anchor.end(),
                })
            }
        };

        let close = match find_matching_close(text, open, '{', '}') {
            Ok(close) => close,
            Err(error) => {
                return Some(Candidate::Broken {
                    offset: open,
                    error,
                })
            }
        };

        let body = &text[open + 1..close];

        // Look for a complete, differently-named definition inside the body.
        let mut search_at = 0usize;
        let inner = loop {
            let inner_caps = match self.header.captures_at(body, search_at) {
                Some(caps) => caps,
                None => {
                    // Clean body; keep scanning inside it for deeper anchors.
                    return Some(Candidate::NotHere {
                        resume_at: anchor.end(),
                    });
                }
            };
            let inner_anchor = inner_caps.get(0).expect("group 0 always present");
            let inner_name = inner_caps.name("name").map(|m| m.as_str());

            let inner_open = match body_open(body, inner_anchor.end()) {
                Some(open) => open,
                None => {
                    search_at = inner_anchor.end();
                    continue;
                }
            };
            let inner_close = match find_matching_close(body, inner_open, '{', '}') {
                Ok(close) => close,
                Err(error) => {
                    return Some(Candidate::Broken {
                        offset: open + 1 + inner_open,
                        error,
                    })
                }
            };

            match inner_name {
                Some(name) if name != outer_name => {
                    break (inner_anchor.start(), inner_close, name.to_string())
                }
                _ => {
                    // Same name (or no binding): not the defect shape.
                    search_at = inner_anchor.end();
                }
            }
        };
        let (inner_start, inner_close, _inner_name) = inner;

        let mut captures = HashMap::new();
        captures.insert(OUTER_NAME.to_string(), outer_name);
        captures.insert(
            OUTER_SIGNATURE.to_string(),
            text[anchor.start()..open].to_string(),
        );
        captures.insert(
            INNER_DEFINITION.to_string(),
            body[inner_start..=inner_close].to_string(),
        );
        let mut remaining = String::new();
        remaining.push_str(&body[..inner_start]);
        remaining.push_str(&body[inner_close + 1..]);
        captures.insert(OUTER_REMAINING_BODY.to_string(), remaining);
        captures.insert(
            INDENT.to_string(),
            line_indent(text, anchor.start()).to_string(),
        );
        captures.insert(
            INNER_INDENT.to_string(),
            line_indent(body, inner_start).to_string(),
        );

        Some(Candidate::Match(RuleMatch {
            rule_id: rule_id.to_string(),
            region: Region::new(text, anchor.start(), close + 1),
            captures,
        }))
    }

    /// Emit the outer definition with its residual body, then the inner
    /// definition as a sibling at the outer's indentation.
    pub fn rewrite(&self, found: &RuleMatch) -> Result<String, RejectReason> {
        let signature = found.require(OUTER_SIGNATURE)?.trim_end();
        let residual = found.require(OUTER_REMAINING_BODY)?;
        let inner = found.require(INNER_DEFINITION)?;
        let indent = found.require(INDENT)?;
        let inner_indent = found.require(INNER_INDENT)?;
        let body_indent = format!("{indent}    ");

        let mut out = String::new();
        out.push_str(signature);

        let residual_lines: Vec<&str> = residual
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if residual_lines.is_empty() {
            out.push_str(" {}");
        } else {
            out.push_str(" {\n");
            for line in &residual_lines {
                out.push_str(&body_indent);
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(indent);
            out.push('}');
        }

        // Sibling at the outer's indentation, dedented from its original
        // nesting level line by line.
        out.push('\n');
        for (idx, line) in inner.lines().enumerate() {
            if idx > 0 {
                out.push('\n');
            }
            out.push_str(indent);
            out.push_str(line.strip_prefix(inner_indent).unwrap_or(line.trim_start()));
        }

        Ok(out)
    }
}

/// Offset of the body-opening `{` after a header match, or `None` when a
/// `;` (or end of text) comes first.
fn body_open(text: &str, header_end: usize) -> Option<usize> {
    for (rel, ch) in text[header_end..].char_indices() {
        match ch {
            '{' => return Some(header_end + rel),
            ';' => return None,
            _ => {}
        }
    }
    None
}

/// Leading whitespace of the line containing `offset`, or `""` when the
/// offset is not the first non-whitespace of its line.
fn line_indent(text: &str, offset: usize) -> &str {
    let line_start = text[..offset].rfind('\n').map_or(0, |nl| nl + 1);
    let prefix = &text[line_start..offset];
    if prefix.chars().all(char::is_whitespace) {
        prefix
    } else {
        ""
    }
}
