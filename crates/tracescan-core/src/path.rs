//! Field-path language for addressing one value inside a JSON document.
//!
//! A path is a dot-separated list of segments, each an object key or an
//! array index: `user.tags.#0` reads `doc["user"]["tags"][0]`.
//!
//! Grammar:
//! - Segments are separated by `.`; empty segments are illegal and at least
//!   one segment is required.
//! - A segment whose first byte is `#` is an array index; the remaining
//!   bytes must be base-10 digits. A second `#` at the start is an error.
//! - `\` escapes the next byte. Legal escapes are `\.`, `\"`, `\'`, `\\`
//!   and `\#`; any other escape is an error. A lone trailing `\` is kept
//!   as a literal backslash.
//! - A `#` appearing after the first byte of a segment is a literal `#`
//!   in an object key, not an index marker.

use serde_json::Value;

use crate::error::Error;

/// One step of a compiled path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Descend into an object by key.
    Key(String),
    /// Descend into an array by position.
    Index(usize),
}

/// A compiled field path, shared by value with the predicate node that
/// owns it. Compilation happens once; evaluation never re-parses strings.
pub type Path = Vec<Segment>;

fn syntax_error(path: &str, message: &str) -> Error {
    Error::PathSyntax {
        path: path.to_string(),
        message: message.to_string(),
    }
}

/// Close out the segment accumulated in `buf`.
fn flush_segment(
    path: &str,
    buf: &mut String,
    is_index: &mut bool,
    segments: &mut Path,
) -> Result<(), Error> {
    if buf.is_empty() {
        return Err(syntax_error(path, "empty segment"));
    }
    if *is_index {
        let index = buf
            .parse::<usize>()
            .map_err(|_| syntax_error(path, "array index must be base-10 digits"))?;
        segments.push(Segment::Index(index));
    } else {
        segments.push(Segment::Key(std::mem::take(buf)));
    }
    buf.clear();
    *is_index = false;
    Ok(())
}

/// Compile a path string into its segment list.
pub fn parse_path(path: &str) -> Result<Path, Error> {
    let mut segments = Path::new();
    let mut buf = String::new();
    let mut is_index = false;

    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('.' | '"' | '\'' | '\\' | '#')) => buf.push(escaped),
                Some(_) => {
                    return Err(syntax_error(
                        path,
                        r#"escape supports only `"`, `'`, `.`, `\` and `#`"#,
                    ))
                }
                // A trailing lone backslash stays literal.
                None => buf.push('\\'),
            },
            '.' => flush_segment(path, &mut buf, &mut is_index, &mut segments)?,
            '#' => {
                if !buf.is_empty() {
                    // Literal `#` inside an object key.
                    buf.push('#');
                } else if !is_index {
                    is_index = true;
                } else {
                    return Err(syntax_error(path, "duplicate `#` index marker"));
                }
            }
            c => buf.push(c),
        }
    }
    flush_segment(path, &mut buf, &mut is_index, &mut segments)?;

    Ok(segments)
}

/// Resolve a compiled path against a document.
///
/// Returns `None` when any step is absent, out of bounds, or lands on a
/// value of the wrong container kind. Absence is not an error; predicates
/// treat it as a non-match.
pub fn resolve<'a>(doc: &'a Value, path: &[Segment]) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path {
        current = match segment {
            Segment::Index(index) => current.as_array()?.get(*index)?,
            Segment::Key(key) => current.as_object()?.get(key)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn key(s: &str) -> Segment {
        Segment::Key(s.to_string())
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn single_key() {
        assert_eq!(parse_path("val").unwrap(), vec![key("val")]);
    }

    #[test]
    fn numeric_key_without_marker_is_a_key() {
        assert_eq!(parse_path("123").unwrap(), vec![key("123")]);
    }

    #[test]
    fn index_segment() {
        assert_eq!(parse_path("#123").unwrap(), vec![Segment::Index(123)]);
    }

    #[test]
    fn nested_mixed_segments() {
        assert_eq!(
            parse_path("a.b.#2").unwrap(),
            vec![key("a"), key("b"), Segment::Index(2)]
        );
        assert_eq!(
            parse_path("aaaaa.#123.456").unwrap(),
            vec![key("aaaaa"), Segment::Index(123), key("456")]
        );
    }

    #[test]
    fn escaped_dot_stays_in_key() {
        assert_eq!(parse_path(r"a\.b").unwrap(), vec![key("a.b")]);
    }

    #[test]
    fn escaped_hash_is_a_key() {
        assert_eq!(parse_path(r"\#abc").unwrap(), vec![key("#abc")]);
    }

    #[test]
    fn escaped_backslash_and_quotes() {
        assert_eq!(parse_path(r"a\\b").unwrap(), vec![key(r"a\b")]);
        assert_eq!(parse_path(r#"a\"b"#).unwrap(), vec![key(r#"a"b"#)]);
        assert_eq!(parse_path(r"a\'b").unwrap(), vec![key("a'b")]);
    }

    #[test]
    fn hash_after_first_byte_is_literal() {
        // Observed legacy behavior, kept deliberately: `#` only marks an
        // index at the start of a segment.
        assert_eq!(
            parse_path(r#"aaa"aa.#123.ab#c\.6"#).unwrap(),
            vec![key(r#"aaa"aa"#), Segment::Index(123), key("ab#c.6")]
        );
    }

    #[test]
    fn trailing_backslash_is_literal() {
        assert_eq!(parse_path(r"abc\").unwrap(), vec![key(r"abc\")]);
    }

    #[test]
    fn empty_path_is_an_error() {
        assert!(parse_path("").is_err());
    }

    #[test]
    fn empty_segments_are_errors() {
        assert!(parse_path("a..b").is_err());
        assert!(parse_path(".a").is_err());
        assert!(parse_path("a.").is_err());
        assert!(parse_path("#").is_err());
        assert!(parse_path("a.#").is_err());
    }

    #[test]
    fn double_hash_marker_is_an_error() {
        assert!(parse_path("##1").is_err());
    }

    #[test]
    fn unknown_escape_is_an_error() {
        assert!(parse_path(r"a\nb").is_err());
    }

    #[test]
    fn index_with_non_digits_is_an_error() {
        assert!(parse_path("#12a").is_err());
        assert!(parse_path("#-3").is_err());
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_nested_object_and_array() {
        let doc = json!({"val": {"key": [1, 2, 3]}});
        let path = parse_path("val.key.#1").unwrap();
        assert_eq!(resolve(&doc, &path), Some(&json!(2)));
    }

    #[test]
    fn resolve_out_of_bounds_is_none() {
        let doc = json!({"val": {"key": [1, 2, 3]}});
        let path = parse_path("val.key.#5").unwrap();
        assert_eq!(resolve(&doc, &path), None);
    }

    #[test]
    fn resolve_missing_key_is_none() {
        let doc = json!({"val": 1});
        let path = parse_path("other").unwrap();
        assert_eq!(resolve(&doc, &path), None);
    }

    #[test]
    fn resolve_kind_mismatch_is_none() {
        // Index into an object, key into an array: both absent, not errors.
        let doc = json!({"val": {"key": [1, 2, 3]}});
        assert_eq!(resolve(&doc, &parse_path("val.#0").unwrap()), None);
        assert_eq!(resolve(&doc, &parse_path("val.key.x").unwrap()), None);
    }

    #[test]
    fn resolve_scalar_midway_is_none() {
        let doc = json!({"val": 7});
        let path = parse_path("val.deeper").unwrap();
        assert_eq!(resolve(&doc, &path), None);
    }
}
