pub mod error;
pub mod token;

use compact_str::CompactString;
use error::LexerError;
use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, tag};
use nom::character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, none_of, one_of};
use nom::combinator::{consumed, map, map_res, opt, recognize, value};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::{IResult, Parser};
use smallvec::SmallVec;
use token::{AccessorSegments, Token, TokenKind};

use crate::range::Span;

macro_rules! define_token_parser {
    ($name:ident, $tag:expr, $kind:expr) => {
        fn $name(input: Span) -> IResult<Span, Token> {
            map(tag($tag), |span: Span| Token {
                range: span.into(),
                kind: $kind,
            })
            .parse(input)
        }
    };
}

/// Splits expression text into tokens, appending a trailing `Eof` token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexerError> {
    match tokens(Span::new(input)) {
        Ok((rest, mut parsed)) => {
            if rest.fragment().is_empty() {
                parsed.push(Token {
                    range: rest.into(),
                    kind: TokenKind::Eof,
                });
                Ok(parsed)
            } else {
                Err(LexerError::UnexpectedInput {
                    fragment: rest.fragment().chars().take(24).collect(),
                    range: rest.into(),
                })
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(LexerError::UnexpectedInput {
            fragment: e.input.fragment().chars().take(24).collect(),
            range: e.input.into(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(LexerError::UnexpectedEofDetected),
    }
}

fn tokens(input: Span) -> IResult<Span, Vec<Token>> {
    preceded(multispace0, many0(terminated(token, multispace0))).parse(input)
}

fn token(input: Span) -> IResult<Span, Token> {
    alt((
        multi_char_operator,
        single_char_operator,
        number_literal,
        string_literal,
        identifier,
    ))
    .parse(input)
}

define_token_parser!(star_star, "**", TokenKind::StarStar);
define_token_parser!(l_shift, "<<", TokenKind::LShift);
define_token_parser!(r_shift, ">>", TokenKind::RShift);
define_token_parser!(eq_eq, "==", TokenKind::EqEq);
define_token_parser!(not_eq, "!=", TokenKind::NotEq);
define_token_parser!(regex_match, "=~", TokenKind::RegexMatch);
define_token_parser!(not_match, "!~", TokenKind::NotMatch);
define_token_parser!(amp_amp, "&&", TokenKind::AmpAmp);
define_token_parser!(pipe_pipe, "||", TokenKind::PipePipe);
define_token_parser!(coalesce, "??", TokenKind::Coalesce);
define_token_parser!(lte, "<=", TokenKind::Lte);
define_token_parser!(gte, ">=", TokenKind::Gte);

define_token_parser!(plus, "+", TokenKind::Plus);
define_token_parser!(minus, "-", TokenKind::Minus);
define_token_parser!(star, "*", TokenKind::Star);
define_token_parser!(slash, "/", TokenKind::Slash);
define_token_parser!(percent, "%", TokenKind::Percent);
define_token_parser!(amp, "&", TokenKind::Amp);
define_token_parser!(pipe, "|", TokenKind::Pipe);
define_token_parser!(caret, "^", TokenKind::Caret);
define_token_parser!(tilde, "~", TokenKind::Tilde);
define_token_parser!(lt, "<", TokenKind::Lt);
define_token_parser!(gt, ">", TokenKind::Gt);
define_token_parser!(bang, "!", TokenKind::Bang);
define_token_parser!(question, "?", TokenKind::Question);
define_token_parser!(colon, ":", TokenKind::Colon);
define_token_parser!(comma, ",", TokenKind::Comma);
define_token_parser!(l_paren, "(", TokenKind::LParen);
define_token_parser!(r_paren, ")", TokenKind::RParen);

define_token_parser!(
    empty_double_string,
    "\"\"",
    TokenKind::StringLiteral(String::new())
);
define_token_parser!(
    empty_single_string,
    "''",
    TokenKind::StringLiteral(String::new())
);

fn multi_char_operator(input: Span) -> IResult<Span, Token> {
    alt((
        star_star, l_shift, r_shift, eq_eq, not_eq, regex_match, not_match, amp_amp, pipe_pipe,
        coalesce, lte, gte,
    ))
    .parse(input)
}

fn single_char_operator(input: Span) -> IResult<Span, Token> {
    alt((
        plus, minus, star, slash, percent, amp, pipe, caret, tilde, lt, gt, bang, question, colon,
        comma, l_paren, r_paren,
    ))
    .parse(input)
}

fn number_literal(input: Span) -> IResult<Span, Token> {
    map_res(
        recognize((
            digit1,
            opt(preceded(char('.'), digit1)),
            opt((one_of("eE"), opt(one_of("+-")), digit1)),
        )),
        |span: Span| {
            span.fragment().parse::<f32>().map(|n| Token {
                range: span.into(),
                kind: TokenKind::NumberLiteral(n),
            })
        },
    )
    .parse(input)
}

fn escape_sequence(input: Span) -> IResult<Span, char> {
    alt((
        value('\\', char('\\')),
        value('"', char('"')),
        value('\'', char('\'')),
        value('\n', char('n')),
        value('\t', char('t')),
        value('\r', char('r')),
    ))
    .parse(input)
}

fn double_quoted_string(input: Span) -> IResult<Span, Token> {
    map(
        consumed(delimited(
            char('"'),
            escaped_transform(none_of("\"\\"), '\\', escape_sequence),
            char('"'),
        )),
        |(span, text): (Span, String)| Token {
            range: span.into(),
            kind: TokenKind::StringLiteral(text),
        },
    )
    .parse(input)
}

fn single_quoted_string(input: Span) -> IResult<Span, Token> {
    map(
        consumed(delimited(
            char('\''),
            escaped_transform(none_of("'\\"), '\\', escape_sequence),
            char('\''),
        )),
        |(span, text): (Span, String)| Token {
            range: span.into(),
            kind: TokenKind::StringLiteral(text),
        },
    )
    .parse(input)
}

fn string_literal(input: Span) -> IResult<Span, Token> {
    alt((
        empty_double_string,
        empty_single_string,
        double_quoted_string,
        single_quoted_string,
    ))
    .parse(input)
}

fn ident_text(input: Span) -> IResult<Span, CompactString> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
        |span: Span| CompactString::new(span.fragment()),
    )
    .parse(input)
}

fn identifier(input: Span) -> IResult<Span, Token> {
    map(
        consumed(pair(ident_text, many0(preceded(char('.'), ident_text)))),
        |(span, (first, rest)): (Span, (CompactString, Vec<CompactString>))| {
            let kind = if rest.is_empty() {
                match first.as_str() {
                    "true" => TokenKind::BoolLiteral(true),
                    "false" => TokenKind::BoolLiteral(false),
                    "in" => TokenKind::In,
                    _ => TokenKind::Ident(first),
                }
            } else {
                let mut segments: AccessorSegments = SmallVec::with_capacity(rest.len() + 1);
                segments.push(first);
                segments.extend(rest);
                TokenKind::AccessorPath(segments)
            };
            Token {
                range: span.into(),
                kind,
            }
        },
    )
    .parse(input)
}
