//! Depth-counting delimiter scanner.
//!
//! This is the primitive that makes nested-shape matching possible at all:
//! a regex (greedy or not) cannot find the closing brace of a definition
//! that itself contains another brace-delimited definition. The scanner
//! tracks nesting depth explicitly and only accepts a close when depth
//! returns to zero.
//!
//! Scanning is purely textual: string literals and comments are not
//! interpreted. The defect shapes this tool repairs were produced by
//! textual edits in the first place, so the same model applies cleanly.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("unbalanced delimiters: no close for '{open}' at byte {open_offset} (depth {depth} at end of text)")]
    Unbalanced {
        open: char,
        open_offset: usize,
        depth: usize,
    },

    #[error("byte {offset} is not the opening delimiter '{expected}'")]
    NotAnOpener { offset: usize, expected: char },
}

/// Find the byte offset of the delimiter closing the one at `open_offset`.
///
/// `text[open_offset..]` must start with `open`. Depth starts at 1 just past
/// the opener; every further `open` increments it and every `close`
/// decrements it. The returned offset is where depth first reaches zero.
pub fn find_matching_close(
    text: &str,
    open_offset: usize,
    open: char,
    close: char,
) -> Result<usize, ScanError> {
    if !text[open_offset..].starts_with(open) {
        return Err(ScanError::NotAnOpener {
            offset: open_offset,
            expected: open,
        });
    }

    let mut depth = 1usize;
    let after_open = open_offset + open.len_utf8();

    for (rel, ch) in text[after_open..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Ok(after_open + rel);
            }
        }
    }

    Err(ScanError::Unbalanced {
        open,
        open_offset,
        depth,
    })
}

/// Split `text` on `sep` occurring at zero nesting depth over `()`, `[]`
/// and `{}`. Separators nested inside any of those pairs do not split.
///
/// The returned slices cover `text` exactly, minus the separators; the
/// caller gets each segment's original text verbatim, whitespace included.
/// Unbalanced input is an error rather than a best-effort split.
pub fn split_top_level(text: &str, sep: char) -> Result<Vec<&str>, ScanError> {
    let mut depth = 0usize;
    let mut segments = Vec::new();
    let mut segment_start = 0usize;

    for (offset, ch) in text.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                if depth == 0 {
                    return Err(ScanError::Unbalanced {
                        open: ch,
                        open_offset: offset,
                        depth: 0,
                    });
                }
                depth -= 1;
            }
            _ if ch == sep && depth == 0 => {
                segments.push(&text[segment_start..offset]);
                segment_start = offset + sep.len_utf8();
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(ScanError::Unbalanced {
            open: '(',
            open_offset: segment_start,
            depth,
        });
    }

    segments.push(&text[segment_start..]);
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_flat_pair() {
        let text = "fn f() { body }";
        let close = find_matching_close(text, 7, '{', '}').unwrap();
        assert_eq!(&text[7..=close], "{ body }");
    }

    #[test]
    fn matches_outer_close_past_nested_pair() {
        //           0         1         2
        //           0123456789012345678901234
        let text = "{ inner { deep } tail }";
        let close = find_matching_close(text, 0, '{', '}').unwrap();
        assert_eq!(close, text.len() - 1);
    }

    #[test]
    fn nested_definition_shape_finds_outermost_close() {
        let text = "fn a() {\n    fn b() {\n        x\n    }\n    y\n}";
        let open = text.find('{').unwrap();
        let close = find_matching_close(text, open, '{', '}').unwrap();
        assert_eq!(close, text.len() - 1);
    }

    #[test]
    fn unbalanced_text_is_an_error() {
        let text = "{ never closed { inner }";
        let err = find_matching_close(text, 0, '{', '}').unwrap_err();
        assert!(matches!(
            err,
            ScanError::Unbalanced {
                open: '{',
                open_offset: 0,
                depth: 1
            }
        ));
    }

    #[test]
    fn wrong_opener_is_rejected() {
        let err = find_matching_close("abc", 1, '{', '}').unwrap_err();
        assert!(matches!(err, ScanError::NotAnOpener { offset: 1, .. }));
    }

    #[test]
    fn split_ignores_nested_commas() {
        let segments = split_top_level("a, f(b, c), [d, e], {g, h}", ',').unwrap();
        assert_eq!(segments, vec!["a", " f(b, c)", " [d, e]", " {g, h}"]);
    }

    #[test]
    fn split_preserves_segment_text_verbatim() {
        let segments = split_top_level("  first ,second\n, third ", ',').unwrap();
        assert_eq!(segments, vec!["  first ", "second\n", " third "]);
    }

    #[test]
    fn split_single_segment_when_no_separator() {
        let segments = split_top_level("only", ',').unwrap();
        assert_eq!(segments, vec!["only"]);
    }

    #[test]
    fn split_rejects_unbalanced_input() {
        assert!(split_top_level("a, f(b", ',').is_err());
        assert!(split_top_level("a) b", ',').is_err());
    }

    #[test]
    fn split_empty_text_yields_one_empty_segment() {
        assert_eq!(split_top_level("", ',').unwrap(), vec![""]);
    }
}
