use std::fmt::{self, Debug, Formatter};
use std::mem;

use compact_str::CompactString;
use itertools::Itertools;

use crate::error::eval::{EvalError, TypeErrorTemplate};
use crate::evaluator::Evaluator;
use crate::expression::ExpressionFunction;
use crate::lexer::token::AccessorSegments;
use crate::symbol::OperatorSymbol;
use crate::value::Value;

/// A plain operator kernel: pure over its operands, with the evaluator
/// passed through for the parameter-dependent pieces (NoData lookup).
pub(crate) type OperatorFn = fn(Value, Value, &Evaluator<'_>) -> Result<Value, EvalError>;

pub(crate) type TypeCheck = fn(&Value) -> bool;
pub(crate) type CombinedTypeCheck = fn(&Value, &Value) -> bool;

/// The operation a stage dispatches to once its children have produced
/// values.
#[derive(Clone)]
pub(crate) enum Kernel {
    Operator(OperatorFn),
    Literal(Value),
    Parameter(CompactString),
    Function {
        name: CompactString,
        function: ExpressionFunction,
    },
    Accessor(AccessorSegments),
}

impl Debug for Kernel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::Operator(_) => write!(f, "operator"),
            Kernel::Literal(value) => write!(f, "literal({:?})", value),
            Kernel::Parameter(name) => write!(f, "parameter({})", name),
            Kernel::Function { name, .. } => write!(f, "function({})", name),
            Kernel::Accessor(segments) => write!(f, "accessor({})", segments.iter().join(".")),
        }
    }
}

impl PartialEq for Kernel {
    /// Operators compare by function pointer, named functions by name and
    /// handle identity (matching [`Value`]'s object-identity equality).
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Kernel::Operator(a), Kernel::Operator(b)) => std::ptr::fn_addr_eq(*a, *b),
            (Kernel::Literal(a), Kernel::Literal(b)) => a == b,
            (Kernel::Parameter(a), Kernel::Parameter(b)) => a == b,
            (
                Kernel::Function {
                    name: n1,
                    function: f1,
                },
                Kernel::Function {
                    name: n2,
                    function: f2,
                },
            ) => n1 == n2 && std::sync::Arc::ptr_eq(f1, f2),
            (Kernel::Accessor(a), Kernel::Accessor(b)) => a == b,
            _ => false,
        }
    }
}

/// One node of the evaluator tree.
///
/// Immutable during evaluation; [`EvaluationStage::swap_with`] is only used
/// by the associativity normalization that runs before the first evaluation.
#[derive(Debug, PartialEq)]
pub(crate) struct EvaluationStage {
    pub symbol: OperatorSymbol,
    pub left: Option<Box<EvaluationStage>>,
    pub right: Option<Box<EvaluationStage>>,
    pub operator: Kernel,
    pub left_check: Option<TypeCheck>,
    pub right_check: Option<TypeCheck>,
    /// Overrides the unary checks for operators that do not care which side
    /// a given type is on (string concat, string comparison).
    pub combined_check: Option<CombinedTypeCheck>,
    pub error_template: TypeErrorTemplate,
}

impl EvaluationStage {
    /// A childless stage producing a value on its own.
    pub(crate) fn leaf(symbol: OperatorSymbol, operator: Kernel) -> Self {
        EvaluationStage {
            symbol,
            left: None,
            right: None,
            operator,
            left_check: None,
            right_check: None,
            combined_check: None,
            error_template: TypeErrorTemplate::Modifier,
        }
    }

    pub(crate) fn is_short_circuitable(&self) -> bool {
        matches!(
            self.symbol,
            OperatorSymbol::And
                | OperatorSymbol::Or
                | OperatorSymbol::TernaryTrue
                | OperatorSymbol::TernaryFalse
                | OperatorSymbol::Coalesce
        )
    }

    /// Exchanges the non-child fields of two stages, leaving both child
    /// pointers in place.
    pub(crate) fn swap_with(&mut self, other: &mut EvaluationStage) {
        mem::swap(&mut self.symbol, &mut other.symbol);
        mem::swap(&mut self.operator, &mut other.operator);
        mem::swap(&mut self.left_check, &mut other.left_check);
        mem::swap(&mut self.right_check, &mut other.right_check);
        mem::swap(&mut self.combined_check, &mut other.combined_check);
        mem::swap(&mut self.error_template, &mut other.error_template);
    }
}

/// Addition is numeric unless either side is a string, in which case it
/// concatenates.
pub(crate) fn addition_type_check(left: &Value, right: &Value) -> bool {
    if left.is_numeric() && right.is_numeric() {
        return true;
    }
    left.is_string() || right.is_string()
}

/// Comparison is either between numbers or lexicographic between two
/// strings, never between the two.
pub(crate) fn comparator_type_check(left: &Value, right: &Value) -> bool {
    (left.is_numeric() && right.is_numeric()) || (left.is_string() && right.is_string())
}
