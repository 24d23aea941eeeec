use compact_str::CompactString;
use thiserror::Error;

use crate::lexer::token::Token;

/// Errors that occur while planning a token stream into a stage tree.
#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    /// An unexpected token was encountered during planning.
    #[error("unexpected token `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string() })]
    UnexpectedToken(Token),
    /// The expression ended before a complete stage tree could be planned.
    #[error("unexpected end of expression")]
    UnexpectedEofDetected,
    /// Expected a closing parenthesis `)` but found a different token.
    #[error("expected a closing parenthesis `)` but got `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string() })]
    ExpectedClosingParen(Token),
    /// A call names a function that was never registered.
    #[error("undefined function `{1}`")]
    UndefinedFunction(Token, CompactString),
    /// A literal pattern to the right of `=~`/`!~` failed to compile.
    #[error("unable to compile regexp pattern `{1}`: {2}")]
    InvalidRegex(Token, String, String),
}

impl ParseError {
    /// Returns the token associated with this error, if available.
    #[cold]
    pub fn token(&self) -> Option<&Token> {
        match self {
            ParseError::UnexpectedToken(token) => Some(token),
            ParseError::UnexpectedEofDetected => None,
            ParseError::ExpectedClosingParen(token) => Some(token),
            ParseError::UndefinedFunction(token, _) => Some(token),
            ParseError::InvalidRegex(token, _, _) => Some(token),
        }
    }
}
