//! Predicate compiler: the serialized tagged-JSON wire format into a
//! [`Predicate`] tree.
//!
//! Every node is a JSON object with a numeric `type` tag selecting the
//! variant. Tag values are a wire compatibility contract with existing
//! writers and must never change:
//!
//! ```text
//! 1  Between<int>       2  Between<float>       3  Between<string>
//! 4  RightCompare<int>  5  RightCompare<float>  6  RightCompare<string>
//! 7  LeftCompare<int>   8  LeftCompare<float>   9  LeftCompare<string>
//! 10 RightLike          11 LeftLike             12 BinaryLike
//! 13 InArray<int>       14 InArray<float>       15 InArray<string>
//! 16 And                17 Or
//! ```
//!
//! Compilation is all-or-nothing: any malformed node fails the whole
//! query and no partial tree is surfaced.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;
use crate::path::{parse_path, Path};
use crate::predicate::{CmpOp, Predicate, Scalar};

/// Wire tags, numeric values fixed by the format above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    BetweenInt = 1,
    BetweenFloat = 2,
    BetweenStr = 3,
    RightCompareInt = 4,
    RightCompareFloat = 5,
    RightCompareStr = 6,
    LeftCompareInt = 7,
    LeftCompareFloat = 8,
    LeftCompareStr = 9,
    RightLike = 10,
    LeftLike = 11,
    BinaryLike = 12,
    InArrayInt = 13,
    InArrayFloat = 14,
    InArrayStr = 15,
    And = 16,
    Or = 17,
}

impl Tag {
    fn from_wire(tag: i64) -> Option<Tag> {
        match tag {
            1 => Some(Tag::BetweenInt),
            2 => Some(Tag::BetweenFloat),
            3 => Some(Tag::BetweenStr),
            4 => Some(Tag::RightCompareInt),
            5 => Some(Tag::RightCompareFloat),
            6 => Some(Tag::RightCompareStr),
            7 => Some(Tag::LeftCompareInt),
            8 => Some(Tag::LeftCompareFloat),
            9 => Some(Tag::LeftCompareStr),
            10 => Some(Tag::RightLike),
            11 => Some(Tag::LeftLike),
            12 => Some(Tag::BinaryLike),
            13 => Some(Tag::InArrayInt),
            14 => Some(Tag::InArrayFloat),
            15 => Some(Tag::InArrayStr),
            16 => Some(Tag::And),
            17 => Some(Tag::Or),
            _ => None,
        }
    }
}

/// Scalar kind a typed tag selects.
#[derive(Debug, Clone, Copy)]
enum Kind {
    Int,
    Float,
    Str,
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

fn field<'a>(node: &'a Value, name: &'static str) -> Result<&'a Value, Error> {
    node.get(name).ok_or(Error::MissingField { field: name })
}

/// A scalar of the given kind. Int fields reject non-integer numbers;
/// float fields accept integers (widening only).
fn scalar_of(v: &Value, name: &'static str, kind: Kind) -> Result<Scalar, Error> {
    match kind {
        Kind::Int => v.as_i64().map(Scalar::Int).ok_or(Error::InvalidField {
            field: name,
            expected: "an integer",
        }),
        Kind::Float => v
            .as_f64()
            .map(|f| Scalar::Float(f as f32))
            .ok_or(Error::InvalidField {
                field: name,
                expected: "a number",
            }),
        Kind::Str => v
            .as_str()
            .map(|s| Scalar::Str(s.to_string()))
            .ok_or(Error::InvalidField {
                field: name,
                expected: "a string",
            }),
    }
}

fn scalar_field(node: &Value, name: &'static str, kind: Kind) -> Result<Scalar, Error> {
    scalar_of(field(node, name)?, name, kind)
}

fn scalar_array_field(node: &Value, name: &'static str, kind: Kind) -> Result<Vec<Scalar>, Error> {
    let array = field(node, name)?.as_array().ok_or(Error::InvalidField {
        field: name,
        expected: "an array",
    })?;
    array.iter().map(|v| scalar_of(v, name, kind)).collect()
}

fn str_field<'a>(node: &'a Value, name: &'static str) -> Result<&'a str, Error> {
    field(node, name)?.as_str().ok_or(Error::InvalidField {
        field: name,
        expected: "a string",
    })
}

fn column_field(node: &Value) -> Result<Path, Error> {
    parse_path(str_field(node, "column")?)
}

fn op_field(node: &Value) -> Result<CmpOp, Error> {
    str_field(node, "op")?.parse()
}

fn child_field(node: &Value, name: &'static str) -> Result<Arc<Predicate>, Error> {
    Ok(Arc::new(compile_node(field(node, name)?)?))
}

// ---------------------------------------------------------------------------
// Node builders
// ---------------------------------------------------------------------------

fn between(node: &Value, kind: Kind) -> Result<Predicate, Error> {
    Ok(Predicate::Between {
        path: column_field(node)?,
        lower: scalar_field(node, "lower", kind)?,
        upper: scalar_field(node, "upper", kind)?,
    })
}

fn right_compare(node: &Value, kind: Kind) -> Result<Predicate, Error> {
    Ok(Predicate::RightCompare {
        path: column_field(node)?,
        constant: scalar_field(node, "left", kind)?,
        op: op_field(node)?,
    })
}

fn left_compare(node: &Value, kind: Kind) -> Result<Predicate, Error> {
    Ok(Predicate::LeftCompare {
        path: column_field(node)?,
        constant: scalar_field(node, "right", kind)?,
        op: op_field(node)?,
    })
}

fn in_array(node: &Value, kind: Kind) -> Result<Predicate, Error> {
    Ok(Predicate::InArray {
        path: column_field(node)?,
        values: scalar_array_field(node, "array", kind)?,
    })
}

fn needle_and_column(node: &Value) -> Result<(Path, String), Error> {
    Ok((column_field(node)?, str_field(node, "value")?.to_string()))
}

fn compile_node(node: &Value) -> Result<Predicate, Error> {
    let raw = field(node, "type")?.as_i64().ok_or(Error::InvalidField {
        field: "type",
        expected: "an integer",
    })?;
    let tag = Tag::from_wire(raw).ok_or(Error::UnknownType { tag: raw })?;

    match tag {
        Tag::BetweenInt => between(node, Kind::Int),
        Tag::BetweenFloat => between(node, Kind::Float),
        Tag::BetweenStr => between(node, Kind::Str),
        Tag::RightCompareInt => right_compare(node, Kind::Int),
        Tag::RightCompareFloat => right_compare(node, Kind::Float),
        Tag::RightCompareStr => right_compare(node, Kind::Str),
        Tag::LeftCompareInt => left_compare(node, Kind::Int),
        Tag::LeftCompareFloat => left_compare(node, Kind::Float),
        Tag::LeftCompareStr => left_compare(node, Kind::Str),
        Tag::RightLike => {
            let (path, needle) = needle_and_column(node)?;
            Ok(Predicate::StartsWith { path, needle })
        }
        Tag::LeftLike => {
            let (path, needle) = needle_and_column(node)?;
            Ok(Predicate::EndsWith { path, needle })
        }
        Tag::BinaryLike => {
            let (path, needle) = needle_and_column(node)?;
            Ok(Predicate::Contains { path, needle })
        }
        Tag::InArrayInt => in_array(node, Kind::Int),
        Tag::InArrayFloat => in_array(node, Kind::Float),
        Tag::InArrayStr => in_array(node, Kind::Str),
        Tag::And => Ok(Predicate::And(
            child_field(node, "left")?,
            child_field(node, "right")?,
        )),
        Tag::Or => Ok(Predicate::Or(
            child_field(node, "left")?,
            child_field(node, "right")?,
        )),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compile a serialized predicate into an executable tree.
pub fn compile(bytes: &[u8]) -> Result<Predicate, Error> {
    let document: Value = serde_json::from_slice(bytes)?;
    compile_node(&document)
}

/// Whether `bytes` holds a compilable predicate.
pub fn check(bytes: &[u8]) -> bool {
    compile(bytes).is_ok()
}
