//! Typed boolean predicate tree, evaluated against JSON documents.
//!
//! A predicate is a small expression tree: leaf variants test one value
//! addressed by a field path, `And`/`Or` combine subtrees. Every leaf is
//! typed over one scalar kind; a document value of any other kind (or an
//! absent column) makes the leaf `false`, never an error.
//!
//! Trees are immutable after construction. Inner nodes hold their children
//! behind `Arc`, so a compiled tree is `Send + Sync` and may be evaluated
//! from any number of concurrent scans without synchronization.

use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;
use crate::path::{resolve, Path};

/// A typed constant in a predicate.
///
/// The three kinds are disjoint: a JSON integer never matches a `Float`
/// leaf and a JSON float never matches an `Int` leaf. Float comparison,
/// including equality, is exact IEEE `f32` comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f32),
    Str(String),
}

/// Comparison operator of a compare leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CmpOp {
    fn eval<T: PartialOrd>(self, a: T, b: T) -> bool {
        match self {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
        }
    }
}

impl FromStr for CmpOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "=" | "==" => Ok(CmpOp::Eq),
            "!=" | "<>" => Ok(CmpOp::Ne),
            ">" => Ok(CmpOp::Gt),
            ">=" => Ok(CmpOp::Ge),
            "<=" => Ok(CmpOp::Le),
            "<" => Ok(CmpOp::Lt),
            other => Err(Error::InvalidOperator {
                op: other.to_string(),
            }),
        }
    }
}

/// One node of the predicate tree.
///
/// The compare variants differ only in which side the constant takes:
/// `RightCompare` evaluates `cmp(constant, value, op)` and `LeftCompare`
/// evaluates `cmp(value, constant, op)`. The distinction matters for the
/// ordering operators.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// `lower <= value <= upper`, bounds inclusive, same scalar kind.
    Between {
        path: Path,
        lower: Scalar,
        upper: Scalar,
    },
    /// `cmp(constant, value, op)`.
    RightCompare {
        path: Path,
        constant: Scalar,
        op: CmpOp,
    },
    /// `cmp(value, constant, op)`.
    LeftCompare {
        path: Path,
        constant: Scalar,
        op: CmpOp,
    },
    /// Value equals some element of a constant array (all one kind).
    InArray { path: Path, values: Vec<Scalar> },
    /// String value starts with `needle` (wire name: RightLike).
    StartsWith { path: Path, needle: String },
    /// String value ends with `needle` (wire name: LeftLike).
    EndsWith { path: Path, needle: String },
    /// String value contains `needle` (wire name: BinaryLike).
    Contains { path: Path, needle: String },
    /// Short-circuit conjunction.
    And(Arc<Predicate>, Arc<Predicate>),
    /// Short-circuit disjunction.
    Or(Arc<Predicate>, Arc<Predicate>),
}

/// The value at `v` if it is a JSON integer. Floats are a distinct kind.
fn int_of(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) if n.is_i64() => n.as_i64(),
        _ => None,
    }
}

/// The value at `v` if it is a JSON float. Integers are a distinct kind.
fn float_of(v: &Value) -> Option<f32> {
    match v {
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f as f32),
        _ => None,
    }
}

fn str_of(v: &Value) -> Option<&str> {
    v.as_str()
}

impl Predicate {
    /// Evaluate this tree against one parsed document.
    ///
    /// Never fails: absent columns and kind mismatches evaluate to `false`.
    pub fn eval(&self, doc: &Value) -> bool {
        match self {
            Predicate::Between { path, lower, upper } => {
                let Some(v) = resolve(doc, path) else {
                    return false;
                };
                match (lower, upper) {
                    (Scalar::Int(lo), Scalar::Int(hi)) => {
                        int_of(v).is_some_and(|x| *lo <= x && x <= *hi)
                    }
                    (Scalar::Float(lo), Scalar::Float(hi)) => {
                        float_of(v).is_some_and(|x| *lo <= x && x <= *hi)
                    }
                    (Scalar::Str(lo), Scalar::Str(hi)) => str_of(v)
                        .is_some_and(|x| lo.as_str() <= x && x <= hi.as_str()),
                    // Mixed-kind bounds cannot be constructed by the compiler.
                    _ => false,
                }
            }
            Predicate::RightCompare { path, constant, op } => {
                let Some(v) = resolve(doc, path) else {
                    return false;
                };
                match constant {
                    Scalar::Int(c) => int_of(v).is_some_and(|x| op.eval(*c, x)),
                    Scalar::Float(c) => float_of(v).is_some_and(|x| op.eval(*c, x)),
                    Scalar::Str(c) => str_of(v).is_some_and(|x| op.eval(c.as_str(), x)),
                }
            }
            Predicate::LeftCompare { path, constant, op } => {
                let Some(v) = resolve(doc, path) else {
                    return false;
                };
                match constant {
                    Scalar::Int(c) => int_of(v).is_some_and(|x| op.eval(x, *c)),
                    Scalar::Float(c) => float_of(v).is_some_and(|x| op.eval(x, *c)),
                    Scalar::Str(c) => str_of(v).is_some_and(|x| op.eval(x, c.as_str())),
                }
            }
            Predicate::InArray { path, values } => {
                let Some(v) = resolve(doc, path) else {
                    return false;
                };
                values.iter().any(|candidate| match candidate {
                    Scalar::Int(c) => int_of(v) == Some(*c),
                    Scalar::Float(c) => float_of(v).is_some_and(|x| x == *c),
                    Scalar::Str(c) => str_of(v) == Some(c.as_str()),
                })
            }
            Predicate::StartsWith { path, needle } => resolve(doc, path)
                .and_then(str_of)
                .is_some_and(|s| s.starts_with(needle)),
            Predicate::EndsWith { path, needle } => resolve(doc, path)
                .and_then(str_of)
                .is_some_and(|s| s.ends_with(needle)),
            Predicate::Contains { path, needle } => resolve(doc, path)
                .and_then(str_of)
                .is_some_and(|s| s.contains(needle)),
            Predicate::And(left, right) => left.eval(doc) && right.eval(doc),
            Predicate::Or(left, right) => left.eval(doc) || right.eval(doc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_path;
    use serde_json::json;

    fn path(s: &str) -> Path {
        parse_path(s).unwrap()
    }

    // -----------------------------------------------------------------------
    // Operator parsing
    // -----------------------------------------------------------------------

    #[test]
    fn op_aliases() {
        assert_eq!("=".parse::<CmpOp>().unwrap(), CmpOp::Eq);
        assert_eq!("==".parse::<CmpOp>().unwrap(), CmpOp::Eq);
        assert_eq!("!=".parse::<CmpOp>().unwrap(), CmpOp::Ne);
        assert_eq!("<>".parse::<CmpOp>().unwrap(), CmpOp::Ne);
        assert_eq!(">".parse::<CmpOp>().unwrap(), CmpOp::Gt);
        assert_eq!(">=".parse::<CmpOp>().unwrap(), CmpOp::Ge);
        assert_eq!("<".parse::<CmpOp>().unwrap(), CmpOp::Lt);
        assert_eq!("<=".parse::<CmpOp>().unwrap(), CmpOp::Le);
    }

    #[test]
    fn unknown_op_is_an_error() {
        assert!("=>".parse::<CmpOp>().is_err());
        assert!("".parse::<CmpOp>().is_err());
        assert!("like".parse::<CmpOp>().is_err());
    }

    // -----------------------------------------------------------------------
    // Between
    // -----------------------------------------------------------------------

    #[test]
    fn between_int_bounds_inclusive() {
        let p = Predicate::Between {
            path: path("val"),
            lower: Scalar::Int(5),
            upper: Scalar::Int(9),
        };
        assert!(!p.eval(&json!({"val": 4})));
        assert!(p.eval(&json!({"val": 5})));
        assert!(p.eval(&json!({"val": 7})));
        assert!(p.eval(&json!({"val": 9})));
        assert!(!p.eval(&json!({"val": 10})));
    }

    #[test]
    fn between_is_kind_isolated() {
        let p = Predicate::Between {
            path: path("val"),
            lower: Scalar::Int(5),
            upper: Scalar::Int(9),
        };
        // A float, a numeric string, and an absent column are all non-matches.
        assert!(!p.eval(&json!({"val": 7.0})));
        assert!(!p.eval(&json!({"val": "7"})));
        assert!(!p.eval(&json!({"other": 7})));
    }

    #[test]
    fn between_float_rejects_ints() {
        let p = Predicate::Between {
            path: path("val"),
            lower: Scalar::Float(1.0),
            upper: Scalar::Float(2.0),
        };
        assert!(p.eval(&json!({"val": 1.5})));
        assert!(!p.eval(&json!({"val": 1})));
    }

    #[test]
    fn between_string_is_lexicographic() {
        let p = Predicate::Between {
            path: path("val"),
            lower: Scalar::Str("b".to_string()),
            upper: Scalar::Str("d".to_string()),
        };
        assert!(p.eval(&json!({"val": "c"})));
        assert!(p.eval(&json!({"val": "b"})));
        assert!(!p.eval(&json!({"val": "a"})));
        assert!(!p.eval(&json!({"val": "da"})));
    }

    // -----------------------------------------------------------------------
    // Compare sides
    // -----------------------------------------------------------------------

    #[test]
    fn right_compare_puts_constant_on_the_left() {
        // cmp(10, value, <) is "10 < value".
        let p = Predicate::RightCompare {
            path: path("val"),
            constant: Scalar::Int(10),
            op: CmpOp::Lt,
        };
        assert!(p.eval(&json!({"val": 11})));
        assert!(!p.eval(&json!({"val": 10})));
        assert!(!p.eval(&json!({"val": 9})));
    }

    #[test]
    fn left_compare_puts_constant_on_the_right() {
        // cmp(value, 10, <) is "value < 10".
        let p = Predicate::LeftCompare {
            path: path("val"),
            constant: Scalar::Int(10),
            op: CmpOp::Lt,
        };
        assert!(p.eval(&json!({"val": 9})));
        assert!(!p.eval(&json!({"val": 10})));
        assert!(!p.eval(&json!({"val": 11})));
    }

    #[test]
    fn compare_on_nested_array_path() {
        let p = Predicate::RightCompare {
            path: path("val.key.#1"),
            constant: Scalar::Int(2),
            op: CmpOp::Eq,
        };
        assert!(p.eval(&json!({"val": {"key": [1, 2, 3]}})));

        let out_of_bounds = Predicate::RightCompare {
            path: path("val.key.#5"),
            constant: Scalar::Int(2),
            op: CmpOp::Eq,
        };
        assert!(!out_of_bounds.eval(&json!({"val": {"key": [1, 2, 3]}})));
    }

    #[test]
    fn string_compare_is_byte_wise() {
        let p = Predicate::LeftCompare {
            path: path("name"),
            constant: Scalar::Str("m".to_string()),
            op: CmpOp::Gt,
        };
        assert!(p.eval(&json!({"name": "zebra"})));
        assert!(!p.eval(&json!({"name": "alpha"})));
    }

    // -----------------------------------------------------------------------
    // InArray
    // -----------------------------------------------------------------------

    #[test]
    fn in_array_string_membership() {
        let p = Predicate::InArray {
            path: path("k"),
            values: vec![Scalar::Str("a".to_string()), Scalar::Str("b".to_string())],
        };
        assert!(p.eval(&json!({"k": "a"})));
        assert!(!p.eval(&json!({"k": "c"})));
        assert!(!p.eval(&json!({"k": 1})));
    }

    #[test]
    fn in_array_int_membership() {
        let p = Predicate::InArray {
            path: path("k"),
            values: vec![Scalar::Int(3), Scalar::Int(5)],
        };
        assert!(p.eval(&json!({"k": 5})));
        assert!(!p.eval(&json!({"k": 4})));
        assert!(!p.eval(&json!({"k": 5.0})));
    }

    #[test]
    fn in_array_empty_never_matches() {
        let p = Predicate::InArray {
            path: path("k"),
            values: vec![],
        };
        assert!(!p.eval(&json!({"k": 1})));
    }

    // -----------------------------------------------------------------------
    // Likes
    // -----------------------------------------------------------------------

    #[test]
    fn like_semantics() {
        let starts = Predicate::StartsWith {
            path: path("s"),
            needle: "foo".to_string(),
        };
        let ends = Predicate::EndsWith {
            path: path("s"),
            needle: "foo".to_string(),
        };
        let contains = Predicate::Contains {
            path: path("s"),
            needle: "foo".to_string(),
        };

        assert!(starts.eval(&json!({"s": "foobar"})));
        assert!(!starts.eval(&json!({"s": "barfoo"})));

        assert!(ends.eval(&json!({"s": "barfoo"})));
        assert!(!ends.eval(&json!({"s": "foobar"})));

        assert!(contains.eval(&json!({"s": "xfoox"})));
        assert!(!contains.eval(&json!({"s": "fo"})));
    }

    #[test]
    fn likes_are_false_on_non_strings() {
        let contains = Predicate::Contains {
            path: path("s"),
            needle: "1".to_string(),
        };
        assert!(!contains.eval(&json!({"s": 123})));
        assert!(!contains.eval(&json!({"s": [1]})));
    }

    // -----------------------------------------------------------------------
    // And / Or
    // -----------------------------------------------------------------------

    #[test]
    fn and_or_combinators() {
        let matches = Arc::new(Predicate::RightCompare {
            path: path("a"),
            constant: Scalar::Int(1),
            op: CmpOp::Eq,
        });
        // A kind mismatch: `a` holds an int, not a string.
        let mismatched = Arc::new(Predicate::Contains {
            path: path("a"),
            needle: "x".to_string(),
        });

        let doc = json!({"a": 1});
        let and = Predicate::And(Arc::clone(&matches), Arc::clone(&mismatched));
        let or = Predicate::Or(Arc::clone(&matches), mismatched);

        // The mismatch makes the AND false but never an error.
        assert!(!and.eval(&doc));
        assert!(or.eval(&doc));
    }

    #[test]
    fn predicate_tree_is_shareable_across_threads() {
        let p = Arc::new(Predicate::LeftCompare {
            path: path("v"),
            constant: Scalar::Int(10),
            op: CmpOp::Le,
        });
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let p = Arc::clone(&p);
                std::thread::spawn(move || p.eval(&json!({ "v": i })))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
