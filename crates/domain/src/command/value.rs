use std::fmt;

use serde::{Deserialize, Serialize};

/// Type of a rendered command value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentKind {
    Integer,
    Float,
    Text,
}

/// A value before it is rendered into a command string.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ArgValue {
    pub fn kind(&self) -> FragmentKind {
        match self {
            Self::Integer(_) => FragmentKind::Integer,
            Self::Float(_) => FragmentKind::Float,
            Self::Text(_) => FragmentKind::Text,
        }
    }
}

impl fmt::Display for ArgValue {
    /// Floats always carry six fractional digits (`1.6` renders `1.600000`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:.6}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! integer_arg {
    ($($t:ty),*) => {
        $(impl From<$t> for ArgValue {
            fn from(value: $t) -> Self {
                Self::Integer(i64::from(value))
            }
        })*
    };
}

integer_arg!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for ArgValue {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for ArgValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}
