use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use compact_str::CompactString;
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::accessor::ObjectResolvers;
use crate::error::eval::FunctionError;
use crate::error::{Error, InnerError};
use crate::evaluator::Evaluator;
use crate::lexer;
use crate::params::Parameters;
use crate::parser::Parser;
use crate::stage::EvaluationStage;
use crate::value::Value;

/// A host function callable from expressions. It receives the evaluated
/// arguments as a slice and returns a value or a message that surfaces as
/// `EvalError::Function` carrying the function's registered name.
pub type ExpressionFunction = Arc<dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync>;

/// Named host functions available to an expression at compile time.
#[derive(Clone, Default)]
pub struct Functions {
    entries: FxHashMap<CompactString, ExpressionFunction>,
}

impl Functions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<CompactString>,
        function: impl Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    ) {
        self.entries.insert(name.into(), Arc::new(function));
    }

    /// Builder-style [`Functions::register`].
    pub fn with(
        mut self,
        name: impl Into<CompactString>,
        function: impl Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    ) -> Self {
        self.register(name, function);
        self
    }

    pub(crate) fn get(&self, name: &str) -> Option<&ExpressionFunction> {
        self.entries.get(name)
    }
}

impl Debug for Functions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Functions({})", self.entries.keys().sorted().join(", "))
    }
}

/// A compiled expression: lexed, planned into a stage tree and
/// associativity-normalized once, then evaluated any number of times
/// against parameter bags.
///
/// A compiled expression is immutable and may be shared across threads as
/// long as the parameter sources, functions and resolvers supplied at
/// evaluation time are themselves safe for concurrent use.
///
/// The ternary operators mark "no value" lanes with the NoData sentinel,
/// `f32::MIN_POSITIVE` unless overridden by a `nodata` parameter. Data that
/// legitimately contains the sentinel value aliases with those lanes.
#[derive(Debug)]
pub struct Expression {
    source: String,
    root: EvaluationStage,
}

impl Expression {
    pub fn new(input: &str) -> Result<Self, Error> {
        Self::with_functions(input, &Functions::default())
    }

    pub fn with_functions(input: &str, functions: &Functions) -> Result<Self, Error> {
        let tokens = lexer::tokenize(input)
            .map_err(|err| Error::from_inner(input, InnerError::Lexer(err)))?;
        let root = Parser::new(&tokens, functions)
            .parse()
            .map_err(|err| Error::from_inner(input, InnerError::Parse(err)))?;
        Ok(Expression {
            source: input.to_string(),
            root,
        })
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, parameters: &dyn Parameters) -> Result<Value, Error> {
        self.evaluate_with_resolvers(parameters, &ObjectResolvers::default())
    }

    pub fn evaluate_with_resolvers(
        &self,
        parameters: &dyn Parameters,
        resolvers: &ObjectResolvers,
    ) -> Result<Value, Error> {
        Evaluator::new(parameters, resolvers)
            .evaluate(&self.root)
            .map_err(|err| Error::from_inner(self.source.clone(), InnerError::Eval(err)))
    }
}
