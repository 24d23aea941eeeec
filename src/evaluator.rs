use smallvec::{smallvec, SmallVec};

use crate::accessor::{evaluate_accessor, ObjectResolvers};
use crate::error::eval::EvalError;
use crate::params::{self, Parameters};
use crate::stage::{EvaluationStage, Kernel};
use crate::symbol::OperatorSymbol;
use crate::value::Value;

/// Walks a stage tree depth-first, left then right, handling short-circuit
/// symbols and per-stage type checks before kernel dispatch.
pub(crate) struct Evaluator<'a> {
    parameters: &'a dyn Parameters,
    resolvers: &'a ObjectResolvers,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(parameters: &'a dyn Parameters, resolvers: &'a ObjectResolvers) -> Self {
        Evaluator {
            parameters,
            resolvers,
        }
    }

    pub(crate) fn parameters(&self) -> &dyn Parameters {
        self.parameters
    }

    pub(crate) fn resolvers(&self) -> &ObjectResolvers {
        self.resolvers
    }

    pub(crate) fn no_data(&self) -> Result<f32, EvalError> {
        params::no_data(self.parameters)
    }

    pub(crate) fn evaluate(&self, stage: &EvaluationStage) -> Result<Value, EvalError> {
        // coalesce treats a failing left side as absent instead of aborting
        let left = match &stage.left {
            Some(child) => match self.evaluate(child) {
                Ok(value) => value,
                Err(_) if stage.symbol == OperatorSymbol::Coalesce => Value::None,
                Err(err) => return Err(err),
            },
            None => Value::None,
        };

        if stage.is_short_circuitable() {
            match stage.symbol {
                OperatorSymbol::And if left == Value::FALSE => return Ok(Value::FALSE),
                OperatorSymbol::Or if left == Value::TRUE => return Ok(Value::TRUE),
                OperatorSymbol::Coalesce if !left.is_none() => return Ok(left),
                OperatorSymbol::TernaryTrue if left == Value::FALSE => return Ok(Value::None),
                // only a scalar settles the ternary here; an array left must
                // reach the ternary-else kernel so its NoData lanes pick up
                // the alternative
                OperatorSymbol::TernaryFalse
                    if matches!(
                        left,
                        Value::Number(_) | Value::Bool(_) | Value::String(_)
                    ) =>
                {
                    return Ok(left)
                }
                _ => {}
            }
        }

        let right = match &stage.right {
            Some(child) => self.evaluate(child)?,
            None => Value::None,
        };

        if let Some(check) = stage.combined_check {
            if !check(&left, &right) {
                return Err(type_mismatch(stage, &left));
            }
        } else {
            if let Some(check) = stage.left_check {
                if !check(&left) {
                    return Err(type_mismatch(stage, &left));
                }
            }
            if let Some(check) = stage.right_check {
                if !check(&right) {
                    return Err(type_mismatch(stage, &right));
                }
            }
        }

        self.dispatch(stage, left, right)
    }

    fn dispatch(
        &self,
        stage: &EvaluationStage,
        left: Value,
        right: Value,
    ) -> Result<Value, EvalError> {
        match &stage.operator {
            Kernel::Operator(kernel) => kernel(left, right, self),
            Kernel::Literal(value) => Ok(value.clone()),
            Kernel::Parameter(name) => self.parameters.get(name),
            Kernel::Function { name, function } => {
                let args: SmallVec<[Value; 4]> = match right {
                    Value::None => SmallVec::new(),
                    Value::List(values) => values.into_iter().collect(),
                    value => smallvec![value],
                };
                function(&args).map_err(|err| EvalError::Function {
                    name: name.clone(),
                    message: err.into_message(),
                })
            }
            Kernel::Accessor(segments) => evaluate_accessor(segments, right, self),
        }
    }
}

fn type_mismatch(stage: &EvaluationStage, value: &Value) -> EvalError {
    EvalError::TypeMismatch {
        template: stage.error_template,
        operator: stage.symbol,
        value: value.to_string(),
    }
}
