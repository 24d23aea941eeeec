pub mod eval;

use miette::SourceOffset;

use crate::error::eval::EvalError;
use crate::lexer::error::LexerError;
use crate::parser::error::ParseError;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InnerError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Top-level error for compiling or evaluating an expression, rendered by
/// miette against the expression source.
#[derive(Debug, thiserror::Error, miette::Diagnostic, PartialEq)]
#[error("expression error")]
pub struct Error {
    pub cause: InnerError,
    #[source_code]
    source_code: String,
    #[label("{cause}")]
    location: SourceOffset,
}

impl Error {
    pub(crate) fn from_inner(source_code: impl Into<String>, cause: InnerError) -> Self {
        let source_code = source_code.into();
        let range = match &cause {
            InnerError::Lexer(err) => err.range(),
            InnerError::Parse(err) => err.token().map(|token| token.range),
            // evaluation failures have no single offending token; the whole
            // expression is labeled
            InnerError::Eval(_) => None,
        };
        let location = match range {
            Some(range) => SourceOffset::from_location(
                &source_code,
                range.start.line as usize,
                range.start.column,
            ),
            None => SourceOffset::from(0),
        };
        Self {
            cause,
            source_code,
            location,
        }
    }
}
