//! Parameter values.
//!
//! A value is a closed tagged union; which variants are legal for a given
//! parameter is decided by its [`Domain`](crate::Domain).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric tolerance used when comparing real-valued assignments.
pub const VALUE_TOLERANCE: f64 = 1e-10;

/// State of a command-line flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlagValue {
    On,
    Off,
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "ON"),
            Self::Off => write!(f, "OFF"),
        }
    }
}

/// A concrete value assigned to a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Flag(FlagValue),
    NotSpecified,
}

impl ParameterValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// `true` for values that carry the same meaning as "not set":
    /// a switched-off flag and an unspecified optional.
    pub fn is_absent_equivalent(&self) -> bool {
        matches!(self, Self::Flag(FlagValue::Off) | Self::NotSpecified)
    }

    /// Equality with numeric tolerance.
    ///
    /// A real compared against any number uses [`VALUE_TOLERANCE`]; all other
    /// pairs compare structurally.
    pub fn approx_eq(&self, other: &ParameterValue) -> bool {
        match (self, other) {
            (Self::Real(_), _) | (_, Self::Real(_)) => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => (a - b).abs() < VALUE_TOLERANCE,
                _ => false,
            },
            _ => self == other,
        }
    }
}

/// Render a real so that it always carries a decimal point.
pub fn format_real(value: f64) -> String {
    let mut repr = value.to_string();
    if value.is_finite() && !repr.contains('.') {
        repr.push_str(".0");
    }
    repr
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{}", format_real(*r)),
            Self::Text(s) => write!(f, "{s}"),
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::NotSpecified => write!(f, "NOT_SPECIFIED"),
        }
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<FlagValue> for ParameterValue {
    fn from(value: FlagValue) -> Self {
        Self::Flag(value)
    }
}
