use thiserror::Error;

use crate::range::Range;

#[derive(Error, Debug, PartialEq)]
pub enum LexerError {
    #[error("unexpected input `{fragment}`")]
    UnexpectedInput { fragment: String, range: Range },
    #[error("unexpected EOF detected")]
    UnexpectedEofDetected,
}

impl LexerError {
    /// Returns the source range associated with this error, if available.
    #[cold]
    pub fn range(&self) -> Option<Range> {
        match self {
            LexerError::UnexpectedInput { range, .. } => Some(*range),
            LexerError::UnexpectedEofDetected => None,
        }
    }
}
