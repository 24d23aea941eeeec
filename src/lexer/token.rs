use std::fmt::{self, Display, Formatter};

use compact_str::CompactString;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::range::Range;

/// Segments of a dotted accessor path, root first.
pub type AccessorSegments = SmallVec<[CompactString; 4]>;

#[derive(PartialEq, Debug, Clone)]
pub struct Token {
    pub range: Range,
    pub kind: TokenKind,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum TokenKind {
    Amp,
    AmpAmp,
    AccessorPath(AccessorSegments),
    Bang,
    BoolLiteral(bool),
    Caret,
    Coalesce,
    Colon,
    Comma,
    Eof,
    EqEq,
    Gt,
    Gte,
    Ident(CompactString),
    In,
    LParen,
    LShift,
    Lt,
    Lte,
    Minus,
    NotEq,
    NotMatch,
    NumberLiteral(f32),
    Percent,
    Pipe,
    PipePipe,
    Plus,
    Question,
    RParen,
    RShift,
    RegexMatch,
    Slash,
    Star,
    StarStar,
    StringLiteral(String),
    Tilde,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", self.kind)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match &self {
            TokenKind::Amp => write!(f, "&"),
            TokenKind::AmpAmp => write!(f, "&&"),
            TokenKind::AccessorPath(segments) => write!(f, "{}", segments.iter().join(".")),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::BoolLiteral(b) => write!(f, "{}", b),
            TokenKind::Caret => write!(f, "^"),
            TokenKind::Coalesce => write!(f, "??"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Eof => write!(f, ""),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Gte => write!(f, ">="),
            TokenKind::Ident(ident) => write!(f, "{}", ident),
            TokenKind::In => write!(f, "in"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::LShift => write!(f, "<<"),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Lte => write!(f, "<="),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::NotMatch => write!(f, "!~"),
            TokenKind::NumberLiteral(n) => write!(f, "{}", n),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Question => write!(f, "?"),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::RShift => write!(f, ">>"),
            TokenKind::RegexMatch => write!(f, "=~"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::StarStar => write!(f, "**"),
            TokenKind::StringLiteral(s) => write!(f, "\"{}\"", s),
            TokenKind::Tilde => write!(f, "~"),
        }
    }
}
