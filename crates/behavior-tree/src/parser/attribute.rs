//! Typed task attributes and their conversion from DSL literals.

use std::fmt;
use std::str::FromStr;

use crate::distribution::{
    Distribution, DistributionKind, DoubleDistribution, FloatDistribution, IntegerDistribution,
    LongDistribution,
};
use crate::error::{AttributeError, DistributionFormatError};
use crate::parser::adapters::DistributionAdapters;
use crate::parser::reader::Value;

/// Declared type of a task attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Bool,
    Int,
    Long,
    Float,
    Double,
    String,
    /// A string restricted to the given lower-case names, matched
    /// case-insensitively.
    Enum(&'static [&'static str]),
    Distribution(DistributionKind),
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Bool => f.write_str("a boolean"),
            AttributeKind::Int => f.write_str("an integer"),
            AttributeKind::Long => f.write_str("a long"),
            AttributeKind::Float => f.write_str("a float"),
            AttributeKind::Double => f.write_str("a double"),
            AttributeKind::String => f.write_str("a string"),
            AttributeKind::Enum(names) => write!(f, "one of {}", names.join("|")),
            AttributeKind::Distribution(kind) => write!(f, "a {kind} distribution"),
        }
    }
}

/// An attribute a task kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: &'static str,
    pub kind: AttributeKind,
    pub required: bool,
}

impl AttributeSpec {
    pub const fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// An attribute value converted to its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Distribution(Distribution),
}

fn mismatch(name: &str, expected: &str) -> AttributeError {
    AttributeError::Mismatch {
        name: name.to_string(),
        expected: expected.to_string(),
    }
}

impl AttributeValue {
    pub fn into_bool(self, name: &str) -> Result<bool, AttributeError> {
        match self {
            AttributeValue::Bool(value) => Ok(value),
            _ => Err(mismatch(name, "a boolean")),
        }
    }

    pub fn into_int(self, name: &str) -> Result<i32, AttributeError> {
        match self {
            AttributeValue::Int(value) => Ok(value),
            _ => Err(mismatch(name, "an integer")),
        }
    }

    pub fn into_long(self, name: &str) -> Result<i64, AttributeError> {
        match self {
            AttributeValue::Long(value) => Ok(value),
            AttributeValue::Int(value) => Ok(value.into()),
            _ => Err(mismatch(name, "a long")),
        }
    }

    pub fn into_float(self, name: &str) -> Result<f32, AttributeError> {
        match self {
            AttributeValue::Float(value) => Ok(value),
            _ => Err(mismatch(name, "a float")),
        }
    }

    pub fn into_double(self, name: &str) -> Result<f64, AttributeError> {
        match self {
            AttributeValue::Double(value) => Ok(value),
            AttributeValue::Float(value) => Ok(value.into()),
            _ => Err(mismatch(name, "a double")),
        }
    }

    pub fn into_string(self, name: &str) -> Result<String, AttributeError> {
        match self {
            AttributeValue::String(value) => Ok(value),
            _ => Err(mismatch(name, "a string")),
        }
    }

    /// Parses a string value into an enum deriving `FromStr`.
    pub fn into_enum<T: FromStr>(self, name: &str) -> Result<T, AttributeError> {
        match self {
            AttributeValue::String(value) => value
                .parse()
                .map_err(|_| mismatch(name, &format!("a known variant, found `{value}`"))),
            _ => Err(mismatch(name, "a string")),
        }
    }

    pub fn into_double_distribution(self, name: &str) -> Result<DoubleDistribution, AttributeError> {
        self.into_distribution()
            .and_then(Distribution::into_double)
            .ok_or_else(|| mismatch(name, "a double distribution"))
    }

    pub fn into_float_distribution(self, name: &str) -> Result<FloatDistribution, AttributeError> {
        self.into_distribution()
            .and_then(Distribution::into_float)
            .ok_or_else(|| mismatch(name, "a float distribution"))
    }

    pub fn into_integer_distribution(
        self,
        name: &str,
    ) -> Result<IntegerDistribution, AttributeError> {
        self.into_distribution()
            .and_then(Distribution::into_integer)
            .ok_or_else(|| mismatch(name, "an integer distribution"))
    }

    pub fn into_long_distribution(self, name: &str) -> Result<LongDistribution, AttributeError> {
        self.into_distribution()
            .and_then(Distribution::into_long)
            .ok_or_else(|| mismatch(name, "a long distribution"))
    }

    fn into_distribution(self) -> Option<Distribution> {
        match self {
            AttributeValue::Distribution(distribution) => Some(distribution),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum ConversionError {
    /// The literal cannot represent the declared kind.
    Mismatch,
    Distribution(DistributionFormatError),
}

/// Converts a DSL literal into a value of the declared kind.
pub(crate) fn convert(
    kind: AttributeKind,
    raw: Value,
    adapters: &DistributionAdapters,
) -> Result<AttributeValue, ConversionError> {
    let value = match (kind, raw) {
        (AttributeKind::Bool, Value::Bool(value)) => AttributeValue::Bool(value),
        (AttributeKind::Int, Value::Long(value)) => {
            AttributeValue::Int(i32::try_from(value).map_err(|_| ConversionError::Mismatch)?)
        }
        (AttributeKind::Long, Value::Long(value)) => AttributeValue::Long(value),
        (AttributeKind::Float, Value::Long(value)) => AttributeValue::Float(value as f32),
        (AttributeKind::Float, Value::Double(value)) => AttributeValue::Float(value as f32),
        (AttributeKind::Double, Value::Long(value)) => AttributeValue::Double(value as f64),
        (AttributeKind::Double, Value::Double(value)) => AttributeValue::Double(value),
        (AttributeKind::String, Value::String(value)) => AttributeValue::String(value),
        (AttributeKind::Enum(names), Value::String(value)) => {
            let canonical = names
                .iter()
                .find(|name| name.eq_ignore_ascii_case(&value))
                .ok_or(ConversionError::Mismatch)?;
            AttributeValue::String((*canonical).to_string())
        }
        (AttributeKind::Distribution(kind), raw) => {
            let literal = match raw {
                Value::Long(value) => format!("constant,{value}"),
                Value::Double(value) => format!("constant,{value:?}"),
                Value::String(value) => value,
                Value::Bool(_) | Value::Null => return Err(ConversionError::Mismatch),
            };
            let distribution = adapters
                .to_distribution(&literal, kind)
                .map_err(ConversionError::Distribution)?;
            AttributeValue::Distribution(distribution)
        }
        _ => return Err(ConversionError::Mismatch),
    };
    Ok(value)
}
