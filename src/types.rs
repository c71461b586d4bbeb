// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipedef contributors

//! Parameter types
//!
//! Component inputs, component outputs and pipeline parameters are typed
//! with [`ParamType`]. The textual form follows the familiar annotation
//! syntax (`str`, `int`, `List[List[float]]`, `Dict[str, int]`) so that
//! definition files read naturally.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::errors::{PipedefError, PipedefResult};

/// A value type that can cross a task boundary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    List(Box<ParamType>),
    Dict(Box<ParamType>, Box<ParamType>),
}

/// Coarse type category written into compiled workflows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParameterKind {
    String,
    NumberInteger,
    NumberDouble,
    Boolean,
    List,
    Struct,
}

impl ParamType {
    /// Shorthand for `List[elem]`
    pub fn list(elem: ParamType) -> Self {
        Self::List(Box::new(elem))
    }

    /// Shorthand for `Dict[key, value]`
    pub fn dict(key: ParamType, value: ParamType) -> Self {
        Self::Dict(Box::new(key), Box::new(value))
    }

    /// Check that the type can be represented in a compiled workflow.
    ///
    /// Serialized structs are JSON objects, so dictionary keys must be strings.
    pub fn validate(&self) -> PipedefResult<()> {
        match self {
            Self::String | Self::Integer | Self::Float | Self::Boolean => Ok(()),
            Self::List(elem) => elem.validate(),
            Self::Dict(key, value) => {
                if **key != Self::String {
                    return Err(PipedefError::UnsupportedType {
                        annotation: self.to_string(),
                        reason: format!("dictionary keys must be str, not {}", key),
                    });
                }
                value.validate()
            }
        }
    }

    /// The coarse wire category for this type
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::String => ParameterKind::String,
            Self::Integer => ParameterKind::NumberInteger,
            Self::Float => ParameterKind::NumberDouble,
            Self::Boolean => ParameterKind::Boolean,
            Self::List(_) => ParameterKind::List,
            Self::Dict(_, _) => ParameterKind::Struct,
        }
    }

    /// Whether a literal value is an instance of this type
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Float, Value::Number(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::List(elem), Value::Array(items)) => items.iter().all(|v| elem.accepts(v)),
            (Self::Dict(_, value_ty), Value::Object(map)) => {
                map.values().all(|v| value_ty.accepts(v))
            }
            _ => false,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "str"),
            Self::Integer => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Boolean => write!(f, "bool"),
            Self::List(elem) => write!(f, "List[{}]", elem),
            Self::Dict(key, value) => write!(f, "Dict[{}, {}]", key, value),
        }
    }
}

impl FromStr for ParamType {
    type Err = PipedefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = parse_annotation(s.trim(), s)?;
        ty.validate()?;
        Ok(ty)
    }
}

impl TryFrom<String> for ParamType {
    type Error = PipedefError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ParamType> for String {
    fn from(ty: ParamType) -> Self {
        ty.to_string()
    }
}

/// Short type name of a literal, used in mismatch messages
pub fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "bool".into(),
        Value::Number(n) if n.is_f64() => "float".into(),
        Value::Number(_) => "int".into(),
        Value::String(_) => "str".into(),
        Value::Array(_) => "list".into(),
        Value::Object(_) => "dict".into(),
    }
}

fn unsupported(annotation: &str, reason: impl Into<String>) -> PipedefError {
    PipedefError::UnsupportedType {
        annotation: annotation.to_string(),
        reason: reason.into(),
    }
}

fn parse_annotation(s: &str, full: &str) -> PipedefResult<ParamType> {
    let Some(open) = s.find('[') else {
        return match s {
            "str" => Ok(ParamType::String),
            "int" => Ok(ParamType::Integer),
            "float" => Ok(ParamType::Float),
            "bool" => Ok(ParamType::Boolean),
            "List" | "list" | "Dict" | "dict" => {
                Err(unsupported(full, format!("'{}' needs element type arguments", s)))
            }
            "" => Err(unsupported(full, "empty type annotation")),
            other => Err(unsupported(full, format!("unknown type '{}'", other))),
        };
    };

    if !s.ends_with(']') {
        return Err(unsupported(full, "unbalanced brackets"));
    }

    let head = s[..open].trim();
    let args = split_top_level(&s[open + 1..s.len() - 1])
        .ok_or_else(|| unsupported(full, "unbalanced brackets"))?;

    match (head, args.as_slice()) {
        ("List" | "list", [elem]) => Ok(ParamType::list(parse_annotation(elem, full)?)),
        ("Dict" | "dict", [key, value]) => Ok(ParamType::dict(
            parse_annotation(key, full)?,
            parse_annotation(value, full)?,
        )),
        ("List" | "list", _) => Err(unsupported(full, "List takes exactly one type argument")),
        ("Dict" | "dict", _) => Err(unsupported(full, "Dict takes exactly two type arguments")),
        (other, _) => Err(unsupported(full, format!("unknown generic type '{}'", other))),
    }
}

/// Split generic arguments on commas that are not nested in brackets
fn split_top_level(s: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    parts.push(s[start..].trim());
    Some(parts)
}
