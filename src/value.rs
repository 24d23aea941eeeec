use std::any::Any;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use regex_lite::Regex;

/// Opaque handle to a caller-provided structured value, resolved through
/// [`crate::ObjectResolvers`] when it appears at the root of an accessor chain.
pub type ObjectHandle = Arc<dyn Any + Send + Sync>;

/// A runtime value flowing through the stage tree.
///
/// Numeric values are always `f32`; the `From` conversions widen every other
/// numeric kind (and their `Vec` forms) at the boundary, so a `Value` is
/// canonical by construction.
#[derive(Clone, Default)]
pub enum Value {
    Number(f32),
    NumberArray(Vec<f32>),
    Bool(bool),
    BoolArray(Vec<bool>),
    String(String),
    Regex(Regex),
    List(Vec<Value>),
    Object(ObjectHandle),
    #[default]
    None,
}

impl Value {
    pub const NONE: Value = Self::None;
    pub const TRUE: Value = Self::Bool(true);
    pub const FALSE: Value = Self::Bool(false);

    /// Wraps a structured host value for accessor navigation.
    pub fn object<T: Any + Send + Sync>(value: T) -> Value {
        Value::Object(Arc::new(value))
    }

    #[inline(always)]
    pub fn name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::NumberArray(_) => "number array",
            Value::Bool(_) => "bool",
            Value::BoolArray(_) => "bool array",
            Value::String(_) => "string",
            Value::Regex(_) => "regex",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::None => "None",
        }
    }

    #[inline(always)]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    #[inline(always)]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Number(_) | Value::NumberArray(_))
    }

    #[inline(always)]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::BoolArray(_))
    }

    #[inline(always)]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline(always)]
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    #[inline(always)]
    pub fn is_regex_or_string(&self) -> bool {
        matches!(self, Value::String(_) | Value::Regex(_))
    }
}

impl PartialEq for Value {
    /// Strict per-variant value equality. Numbers use the host's natural
    /// `f32` comparison, so `NaN != NaN`; regexes compare by pattern text and
    /// objects by handle identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::NumberArray(a), Value::NumberArray(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::BoolArray(a), Value::BoolArray(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a.as_str() == b.as_str(),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::None, Value::None) => true,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::NumberArray(values) => write!(f, "[{}]", values.iter().join(", ")),
            Value::Bool(b) => write!(f, "{}", b),
            Value::BoolArray(values) => write!(f, "[{}]", values.iter().join(", ")),
            Value::String(s) => write!(f, "{}", s),
            Value::Regex(pattern) => write!(f, "{}", pattern.as_str()),
            Value::List(values) => write!(f, "({})", values.iter().join(", ")),
            Value::Object(_) => write!(f, "object"),
            Value::None => Ok(()),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Regex(pattern) => write!(f, "/{}/", pattern.as_str()),
            Value::List(values) => {
                write!(f, "(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}", value)?;
                }
                write!(f, ")")
            }
            Value::None => write!(f, "None"),
            other => write!(f, "{}", other),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Vec<bool>> for Value {
    fn from(values: Vec<bool>) -> Self {
        Value::BoolArray(values)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Regex> for Value {
    fn from(pattern: Regex) -> Self {
        Value::Regex(pattern)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::List(values)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Number(value)
    }
}

impl From<Vec<f32>> for Value {
    fn from(values: Vec<f32>) -> Self {
        Value::NumberArray(values)
    }
}

impl From<&[f32]> for Value {
    fn from(values: &[f32]) -> Self {
        Value::NumberArray(values.to_vec())
    }
}

macro_rules! impl_from_numeric {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(value as f32)
                }
            }

            impl From<Vec<$ty>> for Value {
                fn from(values: Vec<$ty>) -> Self {
                    Value::NumberArray(values.into_iter().map(|v| v as f32).collect())
                }
            }

            impl From<&[$ty]> for Value {
                fn from(values: &[$ty]) -> Self {
                    Value::NumberArray(values.iter().map(|&v| v as f32).collect())
                }
            }
        )*
    };
}

impl_from_numeric!(u8, u16, u32, u64, i8, i16, i32, i64, usize, isize, f64);
