//! The stage planner: one function per precedence level over a peekable
//! token stream, each level folding its operators into left-leaning runs.
//! Right-associative runs are repaired afterwards by [`normalize`], which
//! rotates adjacent equal-precedence stages with
//! [`EvaluationStage::swap_with`] so the left-then-right walk evaluates them
//! in the right order.

pub mod error;

use std::iter::Peekable;
use std::slice::Iter;

use error::ParseError;
use regex_lite::Regex;

use crate::error::eval::TypeErrorTemplate;
use crate::expression::Functions;
use crate::kernels;
use crate::lexer::token::{Token, TokenKind};
use crate::stage::{
    addition_type_check, comparator_type_check, CombinedTypeCheck, EvaluationStage, Kernel,
    OperatorFn, TypeCheck,
};
use crate::symbol::{OperatorSymbol, Precedence};
use crate::value::Value;

pub(crate) struct Parser<'a> {
    tokens: Peekable<Iter<'a, Token>>,
    functions: &'a Functions,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: &'a [Token], functions: &'a Functions) -> Self {
        Parser {
            tokens: tokens.iter().peekable(),
            functions,
        }
    }

    pub(crate) fn parse(mut self) -> Result<EvaluationStage, ParseError> {
        match self.tokens.peek() {
            Some(token) if token.is_eof() => return Err(ParseError::UnexpectedEofDetected),
            None => return Err(ParseError::UnexpectedEofDetected),
            _ => {}
        }

        let mut root = self.parse_separator()?;

        match self.tokens.next() {
            Some(token) if token.is_eof() => {}
            Some(token) => return Err(ParseError::UnexpectedToken(token.clone())),
            None => {}
        }

        normalize(&mut root);
        Ok(root)
    }

    /// Consumes the next token when it is a binary operator of the given
    /// precedence level.
    fn accept_level(&mut self, precedence: Precedence) -> Option<(OperatorSymbol, Token)> {
        let token = self.tokens.peek()?;
        let symbol = binary_symbol(&token.kind)?;
        if symbol.precedence() == precedence {
            let token = (*token).clone();
            self.tokens.next();
            Some((symbol, token))
        } else {
            None
        }
    }

    fn parse_level(
        &mut self,
        precedence: Precedence,
        next: fn(&mut Self) -> Result<EvaluationStage, ParseError>,
    ) -> Result<EvaluationStage, ParseError> {
        let mut left = next(self)?;
        while let Some((symbol, token)) = self.accept_level(precedence) {
            let right = next(self)?;
            left = binary_stage(symbol, &token, left, right)?;
        }
        Ok(left)
    }

    fn parse_separator(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::Separator, Self::parse_ternary)
    }

    fn parse_ternary(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::Ternary, Self::parse_logical_or)
    }

    fn parse_logical_or(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::LogicalOr, Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::LogicalAnd, Self::parse_comparator)
    }

    fn parse_comparator(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::Comparator, Self::parse_bitwise)
    }

    fn parse_bitwise(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::Bitwise, Self::parse_bitshift)
    }

    fn parse_bitshift(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::BitShift, Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::Additive, Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::Multiplicative, Self::parse_exponent)
    }

    fn parse_exponent(&mut self) -> Result<EvaluationStage, ParseError> {
        self.parse_level(Precedence::Exponential, Self::parse_prefix)
    }

    fn parse_prefix(&mut self) -> Result<EvaluationStage, ParseError> {
        let symbol = match self.tokens.peek().map(|token| &token.kind) {
            Some(TokenKind::Minus) => Some(OperatorSymbol::Negate),
            Some(TokenKind::Bang) => Some(OperatorSymbol::Invert),
            Some(TokenKind::Tilde) => Some(OperatorSymbol::BitwiseNot),
            _ => None,
        };
        match symbol {
            Some(symbol) => {
                self.tokens.next();
                let right = self.parse_prefix()?;
                Ok(prefix_stage(symbol, right))
            }
            None => self.parse_value(),
        }
    }

    fn parse_value(&mut self) -> Result<EvaluationStage, ParseError> {
        let token = match self.tokens.next() {
            Some(token) => token.clone(),
            None => return Err(ParseError::UnexpectedEofDetected),
        };
        match token.kind {
            TokenKind::NumberLiteral(value) => Ok(EvaluationStage::leaf(
                OperatorSymbol::Literal,
                Kernel::Literal(Value::Number(value)),
            )),
            TokenKind::StringLiteral(ref text) => Ok(EvaluationStage::leaf(
                OperatorSymbol::Literal,
                Kernel::Literal(Value::String(text.clone())),
            )),
            TokenKind::BoolLiteral(value) => Ok(EvaluationStage::leaf(
                OperatorSymbol::Literal,
                Kernel::Literal(Value::Bool(value)),
            )),
            TokenKind::Ident(ref name) => {
                if self.next_is_l_paren() {
                    let function = self
                        .functions
                        .get(name)
                        .cloned()
                        .ok_or_else(|| {
                            ParseError::UndefinedFunction(token.clone(), name.clone())
                        })?;
                    let arguments = self.parse_call_arguments()?;
                    Ok(EvaluationStage {
                        symbol: OperatorSymbol::Function,
                        left: None,
                        right: arguments.map(Box::new),
                        operator: Kernel::Function {
                            name: name.clone(),
                            function,
                        },
                        left_check: None,
                        right_check: None,
                        combined_check: None,
                        error_template: TypeErrorTemplate::Modifier,
                    })
                } else {
                    Ok(EvaluationStage::leaf(
                        OperatorSymbol::Parameter,
                        Kernel::Parameter(name.clone()),
                    ))
                }
            }
            TokenKind::AccessorPath(ref segments) => {
                let arguments = if self.next_is_l_paren() {
                    self.parse_call_arguments()?
                } else {
                    None
                };
                Ok(EvaluationStage {
                    symbol: OperatorSymbol::Accessor,
                    left: None,
                    right: arguments.map(Box::new),
                    operator: Kernel::Accessor(segments.clone()),
                    left_check: None,
                    right_check: None,
                    combined_check: None,
                    error_template: TypeErrorTemplate::Modifier,
                })
            }
            TokenKind::LParen => {
                let inner = self.parse_separator()?;
                self.expect_closing_paren()?;
                Ok(EvaluationStage {
                    symbol: OperatorSymbol::NoopRight,
                    left: None,
                    right: Some(Box::new(inner)),
                    operator: Kernel::Operator(kernels::noop_right),
                    left_check: None,
                    right_check: None,
                    combined_check: None,
                    error_template: TypeErrorTemplate::Modifier,
                })
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEofDetected),
            _ => Err(ParseError::UnexpectedToken(token)),
        }
    }

    fn next_is_l_paren(&mut self) -> bool {
        matches!(
            self.tokens.peek().map(|token| &token.kind),
            Some(TokenKind::LParen)
        )
    }

    /// Parses `( … )` after a function or accessor name. `None` means an
    /// empty argument clause, evaluated as a zero-argument call.
    fn parse_call_arguments(&mut self) -> Result<Option<EvaluationStage>, ParseError> {
        self.tokens.next();
        if matches!(
            self.tokens.peek().map(|token| &token.kind),
            Some(TokenKind::RParen)
        ) {
            self.tokens.next();
            return Ok(None);
        }
        let arguments = self.parse_separator()?;
        self.expect_closing_paren()?;
        Ok(Some(arguments))
    }

    fn expect_closing_paren(&mut self) -> Result<(), ParseError> {
        match self.tokens.next() {
            Some(token) if matches!(token.kind, TokenKind::RParen) => Ok(()),
            Some(token) => Err(ParseError::ExpectedClosingParen(token.clone())),
            None => Err(ParseError::UnexpectedEofDetected),
        }
    }
}

fn binary_symbol(kind: &TokenKind) -> Option<OperatorSymbol> {
    let symbol = match kind {
        TokenKind::Comma => OperatorSymbol::Separate,
        TokenKind::Question => OperatorSymbol::TernaryTrue,
        TokenKind::Colon => OperatorSymbol::TernaryFalse,
        TokenKind::Coalesce => OperatorSymbol::Coalesce,
        TokenKind::PipePipe => OperatorSymbol::Or,
        TokenKind::AmpAmp => OperatorSymbol::And,
        TokenKind::EqEq => OperatorSymbol::Eq,
        TokenKind::NotEq => OperatorSymbol::Neq,
        TokenKind::Gt => OperatorSymbol::Gt,
        TokenKind::Gte => OperatorSymbol::Gte,
        TokenKind::Lt => OperatorSymbol::Lt,
        TokenKind::Lte => OperatorSymbol::Lte,
        TokenKind::RegexMatch => OperatorSymbol::Req,
        TokenKind::NotMatch => OperatorSymbol::Nreq,
        TokenKind::In => OperatorSymbol::In,
        TokenKind::Pipe => OperatorSymbol::BitwiseOr,
        TokenKind::Amp => OperatorSymbol::BitwiseAnd,
        TokenKind::Caret => OperatorSymbol::BitwiseXor,
        TokenKind::LShift => OperatorSymbol::BitwiseLShift,
        TokenKind::RShift => OperatorSymbol::BitwiseRShift,
        TokenKind::Plus => OperatorSymbol::Plus,
        TokenKind::Minus => OperatorSymbol::Minus,
        TokenKind::Star => OperatorSymbol::Multiply,
        TokenKind::Slash => OperatorSymbol::Divide,
        TokenKind::Percent => OperatorSymbol::Modulus,
        TokenKind::StarStar => OperatorSymbol::Exponent,
        _ => return None,
    };
    Some(symbol)
}

type BinaryParts = (
    OperatorFn,
    Option<TypeCheck>,
    Option<TypeCheck>,
    Option<CombinedTypeCheck>,
    TypeErrorTemplate,
);

fn binary_parts(symbol: OperatorSymbol) -> BinaryParts {
    let numeric: TypeCheck = Value::is_numeric;
    let boolean: TypeCheck = Value::is_bool;
    match symbol {
        OperatorSymbol::Plus => (
            kernels::add,
            None,
            None,
            Some(addition_type_check as CombinedTypeCheck),
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::Minus => (
            kernels::subtract,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::Multiply => (
            kernels::multiply,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::Divide => (
            kernels::divide,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::Modulus => (
            kernels::modulus,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::Exponent => (
            kernels::exponent,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::BitwiseAnd => (
            kernels::bitwise_and,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::BitwiseOr => (
            kernels::bitwise_or,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::BitwiseXor => (
            kernels::bitwise_xor,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::BitwiseLShift => (
            kernels::left_shift,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::BitwiseRShift => (
            kernels::right_shift,
            Some(numeric),
            Some(numeric),
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::Eq => (
            kernels::equal,
            None,
            None,
            Some(comparator_type_check as CombinedTypeCheck),
            TypeErrorTemplate::Comparator,
        ),
        OperatorSymbol::Neq => (
            kernels::not_equal,
            None,
            None,
            Some(comparator_type_check as CombinedTypeCheck),
            TypeErrorTemplate::Comparator,
        ),
        OperatorSymbol::Gt => (
            kernels::gt,
            None,
            None,
            Some(comparator_type_check as CombinedTypeCheck),
            TypeErrorTemplate::Comparator,
        ),
        OperatorSymbol::Gte => (
            kernels::gte,
            None,
            None,
            Some(comparator_type_check as CombinedTypeCheck),
            TypeErrorTemplate::Comparator,
        ),
        OperatorSymbol::Lt => (
            kernels::lt,
            None,
            None,
            Some(comparator_type_check as CombinedTypeCheck),
            TypeErrorTemplate::Comparator,
        ),
        OperatorSymbol::Lte => (
            kernels::lte,
            None,
            None,
            Some(comparator_type_check as CombinedTypeCheck),
            TypeErrorTemplate::Comparator,
        ),
        OperatorSymbol::Req => (
            kernels::regex_match,
            Some(Value::is_string as TypeCheck),
            Some(Value::is_regex_or_string as TypeCheck),
            None,
            TypeErrorTemplate::Comparator,
        ),
        OperatorSymbol::Nreq => (
            kernels::not_regex_match,
            Some(Value::is_string as TypeCheck),
            Some(Value::is_regex_or_string as TypeCheck),
            None,
            TypeErrorTemplate::Comparator,
        ),
        OperatorSymbol::And => (
            kernels::and,
            Some(boolean),
            Some(boolean),
            None,
            TypeErrorTemplate::Logical,
        ),
        OperatorSymbol::Or => (
            kernels::or,
            Some(boolean),
            Some(boolean),
            None,
            TypeErrorTemplate::Logical,
        ),
        OperatorSymbol::In => (
            kernels::in_list,
            None,
            Some(Value::is_list as TypeCheck),
            None,
            TypeErrorTemplate::Comparator,
        ),
        OperatorSymbol::Coalesce => (
            kernels::coalesce,
            None,
            None,
            None,
            TypeErrorTemplate::Modifier,
        ),
        OperatorSymbol::TernaryTrue => (
            kernels::ternary_if,
            Some(boolean),
            Some(numeric),
            None,
            TypeErrorTemplate::Ternary,
        ),
        OperatorSymbol::TernaryFalse => (
            kernels::ternary_else,
            None,
            None,
            None,
            TypeErrorTemplate::Ternary,
        ),
        OperatorSymbol::Separate => (
            kernels::separator,
            None,
            None,
            None,
            TypeErrorTemplate::Modifier,
        ),
        _ => unreachable!("not a binary operator symbol"),
    }
}

fn binary_stage(
    symbol: OperatorSymbol,
    token: &Token,
    left: EvaluationStage,
    right: EvaluationStage,
) -> Result<EvaluationStage, ParseError> {
    let right = match symbol {
        OperatorSymbol::Req | OperatorSymbol::Nreq => hoist_regex_literal(right, token)?,
        _ => right,
    };
    let (operator, left_check, right_check, combined_check, error_template) = binary_parts(symbol);
    Ok(EvaluationStage {
        symbol,
        left: Some(Box::new(left)),
        right: Some(Box::new(right)),
        operator: Kernel::Operator(operator),
        left_check,
        right_check,
        combined_check,
        error_template,
    })
}

/// Literal patterns to the right of `=~`/`!~` compile once at plan time,
/// so repeated evaluations skip per-call compilation.
fn hoist_regex_literal(
    right: EvaluationStage,
    token: &Token,
) -> Result<EvaluationStage, ParseError> {
    if let Kernel::Literal(Value::String(pattern)) = &right.operator {
        let compiled = Regex::new(pattern).map_err(|err| {
            ParseError::InvalidRegex(token.clone(), pattern.clone(), err.to_string())
        })?;
        return Ok(EvaluationStage::leaf(
            OperatorSymbol::Literal,
            Kernel::Literal(Value::Regex(compiled)),
        ));
    }
    Ok(right)
}

fn prefix_stage(symbol: OperatorSymbol, right: EvaluationStage) -> EvaluationStage {
    let (operator, right_check): (OperatorFn, TypeCheck) = match symbol {
        OperatorSymbol::Negate => (kernels::negate, Value::is_numeric),
        OperatorSymbol::Invert => (kernels::invert, Value::is_bool),
        OperatorSymbol::BitwiseNot => (kernels::bitwise_not, Value::is_numeric),
        _ => unreachable!("not a prefix operator symbol"),
    };
    EvaluationStage {
        symbol,
        left: None,
        right: Some(Box::new(right)),
        operator: Kernel::Operator(operator),
        left_check: None,
        right_check: Some(right_check),
        combined_check: None,
        error_template: TypeErrorTemplate::Prefix,
    }
}

/// Rotates equal-precedence right-associative runs into shape. The planner's
/// level loops always build left-leaning trees, which walk left-to-right;
/// a `2 ** 3 ** 2` run must instead evaluate right-to-left.
pub(crate) fn normalize(stage: &mut EvaluationStage) {
    while stage.symbol.is_right_associative()
        && stage
            .left
            .as_ref()
            .is_some_and(|left| left.symbol.precedence() == stage.symbol.precedence())
    {
        rotate_right(stage);
    }
    if let Some(left) = stage.left.as_deref_mut() {
        normalize(left);
    }
    if let Some(right) = stage.right.as_deref_mut() {
        normalize(right);
    }
}

/// `((a ∘ b) ∘ c)` becomes `(a ∘ (b ∘ c))`: the two stages exchange their
/// non-child fields through `swap_with` and the operands are re-hung.
fn rotate_right(stage: &mut EvaluationStage) {
    let mut child = stage
        .left
        .take()
        .expect("rotation requires an equal-precedence left child");
    stage.swap_with(&mut child);
    let first = child.left.take();
    let second = child.right.take();
    let third = stage.right.take();
    child.left = second;
    child.right = third;
    stage.left = first;
    stage.right = Some(child);
}
