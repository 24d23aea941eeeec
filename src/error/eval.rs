use compact_str::CompactString;
use thiserror::Error;

use crate::symbol::OperatorSymbol;

/// Which message family a stage reports when one of its type checks rejects
/// an operand. Stages carry the template; the failing check fills it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeErrorTemplate {
    Logical,
    Modifier,
    Comparator,
    Ternary,
    Prefix,
}

impl TypeErrorTemplate {
    fn render(&self, operator: &OperatorSymbol, value: &str) -> String {
        match self {
            TypeErrorTemplate::Logical => format!(
                "value `{value}` cannot be used with the logical operator `{operator}`, it is not a bool"
            ),
            TypeErrorTemplate::Modifier => format!(
                "value `{value}` cannot be used with the modifier `{operator}`, it is not a number"
            ),
            TypeErrorTemplate::Comparator => format!(
                "value `{value}` cannot be used with the comparator `{operator}`, it is not a number"
            ),
            TypeErrorTemplate::Ternary => format!(
                "value `{value}` cannot be used with the ternary operator `{operator}`, it is not a bool"
            ),
            TypeErrorTemplate::Prefix => {
                format!("value `{value}` cannot be used with the prefix `{operator}`")
            }
        }
    }
}

/// Runtime failure while evaluating a compiled expression.
///
/// Every variant surfaces to the evaluation root unchanged; nothing is
/// recovered internally except panic conversion inside the accessor.
#[derive(Error, Debug, PartialEq)]
pub enum EvalError {
    /// A stage type check rejected an operand.
    #[error("{}", .template.render(.operator, .value))]
    TypeMismatch {
        template: TypeErrorTemplate,
        operator: OperatorSymbol,
        value: String,
    },
    /// Two vector operands had different lengths.
    #[error("different array sizes: {left}, {right}")]
    ShapeMismatch { left: usize, right: usize },
    /// A kernel received a variant pair it does not accept.
    #[error("invalid operand for {operator}")]
    InvalidOperand { operator: &'static str },
    #[error("unable to compile regexp pattern `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },
    #[error("unable to access `{segment}`: `{prior}` is not a struct")]
    NotAStruct {
        segment: CompactString,
        prior: CompactString,
    },
    #[error("no method or field `{segment}` present on `{prior}`")]
    NoSuchMember {
        segment: CompactString,
        prior: CompactString,
    },
    #[error("no resolver registered for the object at `{path}`")]
    NoResolver { path: String },
    #[error("method call failed `{path}`: {message}")]
    MethodCall { path: String, message: String },
    #[error("failed to access `{path}`: {message}")]
    AccessorPanic { path: String, message: String },
    #[error("no parameter `{0}` found")]
    UnknownParameter(CompactString),
    #[error("invalid nodata value: {0}")]
    InvalidNoData(String),
    #[error("function `{name}` failed: {message}")]
    Function {
        name: CompactString,
        message: String,
    },
}

/// Error returned by a caller-registered expression function.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct FunctionError(String);

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        FunctionError(message.into())
    }

    pub(crate) fn into_message(self) -> String {
        self.0
    }
}

impl From<&str> for FunctionError {
    fn from(message: &str) -> Self {
        FunctionError(message.to_string())
    }
}

impl From<String> for FunctionError {
    fn from(message: String) -> Self {
        FunctionError(message)
    }
}
