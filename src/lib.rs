//! `vexpr` evaluates arithmetic/logical expressions at runtime against a
//! caller-supplied parameter bag, producing either a scalar value or an
//! element-wise vectorized result.
//!
//! The same compiled expression is meant to be applied repeatedly to
//! parameter bundles containing single numbers or parallel `f32` arrays
//! (pixel/tile computations); vector-aware operators broadcast scalars over
//! arrays so no outer per-element interpretation loop is needed.
//!
//! ## Examples
//!
//! ```rust
//! use vexpr::{Expression, MapParameters, Value};
//!
//! let expression = Expression::new("(x > 0) ? x : -x").unwrap();
//! let params = MapParameters::new().with("x", vec![-1.0f32, 2.0, -3.0]);
//!
//! assert_eq!(
//!     expression.evaluate(&params).unwrap(),
//!     Value::NumberArray(vec![1.0, 2.0, 3.0]),
//! );
//!
//! // host functions and object accessors
//! use vexpr::{Functions, ObjectResolvers};
//!
//! struct Tile { width: f32 }
//!
//! let functions = Functions::new()
//!     .with("halve", |args: &[Value]| match args {
//!         [Value::Number(n)] => Ok(Value::Number(n / 2.0)),
//!         _ => Err("halve expects one number".into()),
//!     });
//! let resolvers = ObjectResolvers::new()
//!     .with::<Tile>(|r| r.field("Width", |tile: &Tile| Value::from(tile.width)));
//!
//! let expression = Expression::with_functions("halve(tile.Width)", &functions).unwrap();
//! let params = MapParameters::new().with("tile", Value::object(Tile { width: 256.0 }));
//!
//! assert_eq!(
//!     expression.evaluate_with_resolvers(&params, &resolvers).unwrap(),
//!     Value::Number(128.0),
//! );
//! ```

mod accessor;
mod error;
mod evaluator;
mod expression;
mod kernels;
mod lexer;
mod params;
mod parser;
mod range;
mod stage;
mod symbol;
mod value;

pub use accessor::{ObjectResolvers, ResolverBuilder, TypeResolver};
pub use error::eval::{EvalError, FunctionError, TypeErrorTemplate};
pub use error::{Error, InnerError};
pub use expression::{Expression, ExpressionFunction, Functions};
pub use lexer::error::LexerError;
pub use lexer::token::{AccessorSegments, Token, TokenKind};
pub use params::{MapParameters, Parameters, NO_DATA_PARAMETER};
pub use parser::error::ParseError;
pub use range::{Position, Range};
pub use symbol::OperatorSymbol;
pub use value::{ObjectHandle, Value};

/// Splits expression text into tokens.
pub fn tokenize(code: &str) -> Result<Vec<Token>, Error> {
    lexer::tokenize(code).map_err(|err| Error::from_inner(code, InnerError::Lexer(err)))
}

/// Compiles expression text; shorthand for [`Expression::new`].
pub fn parse(code: &str) -> Result<Expression, Error> {
    Expression::new(code)
}
