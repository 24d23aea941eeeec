//! Operator kernels.
//!
//! Every binary numeric kernel applies the same broadcasting matrix: two
//! arrays must agree in length and combine element-wise, a scalar against an
//! array is broadcast, two scalars produce a scalar. Anything else is an
//! operand error naming the operator. The shared helpers below implement the
//! matrix once; the kernels supply the per-lane function.

use regex_lite::Regex;

use crate::error::eval::EvalError;
use crate::evaluator::Evaluator;
use crate::value::Value;

fn check_lengths(left: usize, right: usize) -> Result<(), EvalError> {
    if left == right {
        Ok(())
    } else {
        Err(EvalError::ShapeMismatch { left, right })
    }
}

fn broadcast_numbers(
    operator: &'static str,
    left: Value,
    right: Value,
    f: impl Fn(f32, f32) -> f32,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::NumberArray(l), Value::NumberArray(r)) => {
            check_lengths(l.len(), r.len())?;
            Ok(Value::NumberArray(
                l.iter().zip(&r).map(|(&a, &b)| f(a, b)).collect(),
            ))
        }
        (Value::NumberArray(l), Value::Number(r)) => Ok(Value::NumberArray(
            l.into_iter().map(|a| f(a, r)).collect(),
        )),
        (Value::Number(l), Value::NumberArray(r)) => Ok(Value::NumberArray(
            r.into_iter().map(|b| f(l, b)).collect(),
        )),
        (Value::Number(l), Value::Number(r)) => Ok(Value::Number(f(l, r))),
        _ => Err(EvalError::InvalidOperand { operator }),
    }
}

fn broadcast_comparison(
    operator: &'static str,
    left: Value,
    right: Value,
    f: impl Fn(f32, f32) -> bool,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::NumberArray(l), Value::NumberArray(r)) => {
            check_lengths(l.len(), r.len())?;
            Ok(Value::BoolArray(
                l.iter().zip(&r).map(|(&a, &b)| f(a, b)).collect(),
            ))
        }
        (Value::NumberArray(l), Value::Number(r)) => Ok(Value::BoolArray(
            l.into_iter().map(|a| f(a, r)).collect(),
        )),
        (Value::Number(l), Value::NumberArray(r)) => Ok(Value::BoolArray(
            r.into_iter().map(|b| f(l, b)).collect(),
        )),
        (Value::Number(l), Value::Number(r)) => Ok(Value::Bool(f(l, r))),
        _ => Err(EvalError::InvalidOperand { operator }),
    }
}

fn broadcast_bools(
    operator: &'static str,
    left: Value,
    right: Value,
    f: impl Fn(bool, bool) -> bool,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::BoolArray(l), Value::BoolArray(r)) => {
            check_lengths(l.len(), r.len())?;
            Ok(Value::BoolArray(
                l.iter().zip(&r).map(|(&a, &b)| f(a, b)).collect(),
            ))
        }
        (Value::BoolArray(l), Value::Bool(r)) => Ok(Value::BoolArray(
            l.into_iter().map(|a| f(a, r)).collect(),
        )),
        (Value::Bool(l), Value::BoolArray(r)) => Ok(Value::BoolArray(
            r.into_iter().map(|b| f(l, b)).collect(),
        )),
        (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(f(l, r))),
        _ => Err(EvalError::InvalidOperand { operator }),
    }
}

pub(crate) fn add(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    // string concat if either side is a string
    if left.is_string() || right.is_string() {
        return Ok(Value::String(format!("{}{}", left, right)));
    }
    broadcast_numbers("addition", left, right, |a, b| a + b)
}

pub(crate) fn subtract(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    broadcast_numbers("subtraction", left, right, |a, b| a - b)
}

pub(crate) fn multiply(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    broadcast_numbers("multiplication", left, right, |a, b| a * b)
}

pub(crate) fn divide(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    broadcast_numbers("division", left, right, |a, b| a / b)
}

pub(crate) fn modulus(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    broadcast_numbers("modulus", left, right, |a, b| ((a as f64) % (b as f64)) as f32)
}

pub(crate) fn exponent(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    broadcast_numbers("exponential", left, right, |a, b| {
        (a as f64).powf(b as f64) as f32
    })
}

pub(crate) fn gte(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Ok(Value::Bool(a >= b));
    }
    broadcast_comparison(">=", left, right, |a, b| a >= b)
}

pub(crate) fn gt(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Ok(Value::Bool(a > b));
    }
    broadcast_comparison(">", left, right, |a, b| a > b)
}

pub(crate) fn lte(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Ok(Value::Bool(a <= b));
    }
    broadcast_comparison("<=", left, right, |a, b| a <= b)
}

pub(crate) fn lt(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Ok(Value::Bool(a < b));
    }
    broadcast_comparison("<", left, right, |a, b| a < b)
}

pub(crate) fn equal(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Ok(Value::Bool(a == b));
    }
    broadcast_comparison("==", left, right, |a, b| a == b)
}

pub(crate) fn not_equal(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    if let (Value::String(a), Value::String(b)) = (&left, &right) {
        return Ok(Value::Bool(a != b));
    }
    broadcast_comparison("!=", left, right, |a, b| a != b)
}

pub(crate) fn and(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    broadcast_bools("&&", left, right, |a, b| a && b)
}

pub(crate) fn or(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    broadcast_bools("||", left, right, |a, b| a || b)
}

pub(crate) fn negate(_: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    match right {
        Value::NumberArray(values) => {
            Ok(Value::NumberArray(values.into_iter().map(|v| -v).collect()))
        }
        Value::Number(value) => Ok(Value::Number(-value)),
        _ => Err(EvalError::InvalidOperand { operator: "-" }),
    }
}

pub(crate) fn invert(_: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    match right {
        Value::BoolArray(values) => Ok(Value::BoolArray(values.into_iter().map(|v| !v).collect())),
        Value::Bool(value) => Ok(Value::Bool(!value)),
        _ => Err(EvalError::InvalidOperand { operator: "!" }),
    }
}

pub(crate) fn bitwise_not(_: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    match right {
        Value::NumberArray(values) => Ok(Value::NumberArray(
            values.into_iter().map(|v| !(v as i64) as f32).collect(),
        )),
        Value::Number(value) => Ok(Value::Number(!(value as i64) as f32)),
        _ => Err(EvalError::InvalidOperand { operator: "~" }),
    }
}

pub(crate) fn bitwise_or(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    broadcast_numbers("|", left, right, |a, b| ((a as i64) | (b as i64)) as f32)
}

pub(crate) fn bitwise_and(
    left: Value,
    right: Value,
    _: &Evaluator<'_>,
) -> Result<Value, EvalError> {
    broadcast_numbers("&", left, right, |a, b| ((a as i64) & (b as i64)) as f32)
}

pub(crate) fn bitwise_xor(
    left: Value,
    right: Value,
    _: &Evaluator<'_>,
) -> Result<Value, EvalError> {
    broadcast_numbers("^", left, right, |a, b| ((a as i64) ^ (b as i64)) as f32)
}

pub(crate) fn left_shift(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    broadcast_numbers("<<", left, right, |a, b| {
        (a as u64).checked_shl(b as u32).unwrap_or(0) as f32
    })
}

pub(crate) fn right_shift(
    left: Value,
    right: Value,
    _: &Evaluator<'_>,
) -> Result<Value, EvalError> {
    broadcast_numbers(">>", left, right, |a, b| {
        (a as u64).checked_shr(b as u32).unwrap_or(0) as f32
    })
}

/// Lane-wise selection: lanes where the condition holds take the value,
/// the rest take the NoData sentinel. A scalar `false` condition never
/// reaches this kernel; the driver short-circuits it to `None`.
pub(crate) fn ternary_if(left: Value, right: Value, ev: &Evaluator<'_>) -> Result<Value, EvalError> {
    let no_data = ev.no_data()?;
    match (left, right) {
        (Value::BoolArray(cond), Value::NumberArray(values)) => {
            check_lengths(cond.len(), values.len())?;
            Ok(Value::NumberArray(
                cond.iter()
                    .zip(&values)
                    .map(|(&c, &v)| if c { v } else { no_data })
                    .collect(),
            ))
        }
        (Value::BoolArray(cond), Value::Number(value)) => Ok(Value::NumberArray(
            cond.into_iter()
                .map(|c| if c { value } else { no_data })
                .collect(),
        )),
        (Value::Bool(cond), Value::NumberArray(values)) => Ok(Value::NumberArray(
            values
                .into_iter()
                .map(|v| if cond { v } else { no_data })
                .collect(),
        )),
        (Value::Bool(cond), Value::Number(value)) => {
            Ok(Value::Number(if cond { value } else { no_data }))
        }
        _ => Err(EvalError::InvalidOperand {
            operator: "ternary if",
        }),
    }
}

/// Lanes equal to the NoData sentinel are replaced by the alternative; a
/// `None` left (short-circuited ternary-if) takes the alternative whole.
pub(crate) fn ternary_else(
    left: Value,
    right: Value,
    ev: &Evaluator<'_>,
) -> Result<Value, EvalError> {
    let no_data = ev.no_data()?;
    match (left, right) {
        (Value::None, alternative) => Ok(alternative),
        (Value::NumberArray(values), Value::NumberArray(alternatives)) => {
            check_lengths(values.len(), alternatives.len())?;
            Ok(Value::NumberArray(
                values
                    .iter()
                    .zip(&alternatives)
                    .map(|(&v, &a)| if v == no_data { a } else { v })
                    .collect(),
            ))
        }
        (Value::NumberArray(values), Value::Number(alternative)) => Ok(Value::NumberArray(
            values
                .into_iter()
                .map(|v| if v == no_data { alternative } else { v })
                .collect(),
        )),
        (Value::Number(value), Value::NumberArray(alternatives)) => Ok(Value::NumberArray(
            alternatives
                .into_iter()
                .map(|a| if value == no_data { a } else { value })
                .collect(),
        )),
        (Value::Number(value), Value::Number(alternative)) => Ok(Value::Number(
            if value == no_data { alternative } else { value },
        )),
        _ => Err(EvalError::InvalidOperand {
            operator: "ternary else",
        }),
    }
}

fn compile_pattern(value: Value) -> Result<Regex, EvalError> {
    match value {
        Value::Regex(pattern) => Ok(pattern),
        Value::String(pattern) => Regex::new(&pattern).map_err(|err| EvalError::InvalidRegex {
            message: err.to_string(),
            pattern,
        }),
        _ => Err(EvalError::InvalidOperand { operator: "=~" }),
    }
}

pub(crate) fn regex_match(
    left: Value,
    right: Value,
    _: &Evaluator<'_>,
) -> Result<Value, EvalError> {
    let pattern = compile_pattern(right)?;
    match left {
        Value::String(subject) => Ok(Value::Bool(pattern.is_match(&subject))),
        _ => Err(EvalError::InvalidOperand { operator: "=~" }),
    }
}

pub(crate) fn not_regex_match(
    left: Value,
    right: Value,
    ev: &Evaluator<'_>,
) -> Result<Value, EvalError> {
    match regex_match(left, right, ev)? {
        Value::Bool(matched) => Ok(Value::Bool(!matched)),
        _ => Err(EvalError::InvalidOperand { operator: "!~" }),
    }
}

pub(crate) fn coalesce(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    if left.is_none() {
        Ok(right)
    } else {
        Ok(left)
    }
}

pub(crate) fn separator(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    match left {
        Value::List(mut values) => {
            values.push(right);
            Ok(Value::List(values))
        }
        other => Ok(Value::List(vec![other, right])),
    }
}

pub(crate) fn in_list(left: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    match right {
        Value::List(values) => Ok(Value::Bool(values.iter().any(|value| *value == left))),
        _ => Err(EvalError::InvalidOperand { operator: "in" }),
    }
}

pub(crate) fn noop_right(_: Value, right: Value, _: &Evaluator<'_>) -> Result<Value, EvalError> {
    Ok(right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::ObjectResolvers;
    use crate::params::{MapParameters, NO_DATA_PARAMETER};
    use rstest::rstest;

    fn eval_kernel(
        kernel: fn(Value, Value, &Evaluator<'_>) -> Result<Value, EvalError>,
        left: Value,
        right: Value,
    ) -> Result<Value, EvalError> {
        let params = MapParameters::new();
        let resolvers = ObjectResolvers::default();
        let ev = Evaluator::new(&params, &resolvers);
        kernel(left, right, &ev)
    }

    fn eval_kernel_with(
        kernel: fn(Value, Value, &Evaluator<'_>) -> Result<Value, EvalError>,
        left: Value,
        right: Value,
        params: &MapParameters,
    ) -> Result<Value, EvalError> {
        let resolvers = ObjectResolvers::default();
        let ev = Evaluator::new(params, &resolvers);
        kernel(left, right, &ev)
    }

    #[rstest]
    #[case(Value::Number(2.0), Value::Number(3.0), Value::Number(5.0))]
    #[case(
        Value::NumberArray(vec![1.0, 2.0, 3.0]),
        Value::Number(10.0),
        Value::NumberArray(vec![11.0, 12.0, 13.0])
    )]
    #[case(
        Value::Number(10.0),
        Value::NumberArray(vec![1.0, 2.0]),
        Value::NumberArray(vec![11.0, 12.0])
    )]
    #[case(
        Value::NumberArray(vec![1.0, 2.0]),
        Value::NumberArray(vec![10.0, 20.0]),
        Value::NumberArray(vec![11.0, 22.0])
    )]
    #[case(
        Value::String("foo".to_string()),
        Value::Number(1.0),
        Value::String("foo1".to_string())
    )]
    #[case(
        Value::Number(1.0),
        Value::String("px".to_string()),
        Value::String("1px".to_string())
    )]
    #[case(
        Value::String("a".to_string()),
        Value::String("b".to_string()),
        Value::String("ab".to_string())
    )]
    fn test_add(#[case] left: Value, #[case] right: Value, #[case] expected: Value) {
        assert_eq!(eval_kernel(add, left, right), Ok(expected));
    }

    #[test]
    fn test_add_shape_mismatch() {
        assert_eq!(
            eval_kernel(
                add,
                Value::NumberArray(vec![1.0, 2.0, 3.0]),
                Value::NumberArray(vec![1.0, 2.0])
            ),
            Err(EvalError::ShapeMismatch { left: 3, right: 2 })
        );
    }

    #[test]
    fn test_add_invalid_operand() {
        assert_eq!(
            eval_kernel(add, Value::Bool(true), Value::Number(1.0)),
            Err(EvalError::InvalidOperand {
                operator: "addition"
            })
        );
    }

    #[rstest]
    #[case(subtract, Value::Number(5.0), Value::Number(2.0), Value::Number(3.0))]
    #[case(multiply, Value::Number(5.0), Value::Number(2.0), Value::Number(10.0))]
    #[case(divide, Value::Number(5.0), Value::Number(2.0), Value::Number(2.5))]
    #[case(modulus, Value::Number(5.0), Value::Number(2.0), Value::Number(1.0))]
    #[case(modulus, Value::Number(-5.0), Value::Number(2.0), Value::Number(-1.0))]
    #[case(exponent, Value::Number(2.0), Value::Number(10.0), Value::Number(1024.0))]
    #[case(
        exponent,
        Value::NumberArray(vec![2.0, 3.0]),
        Value::Number(2.0),
        Value::NumberArray(vec![4.0, 9.0])
    )]
    #[case(
        subtract,
        Value::Number(10.0),
        Value::NumberArray(vec![1.0, 2.0]),
        Value::NumberArray(vec![9.0, 8.0])
    )]
    fn test_arithmetic(
        #[case] kernel: fn(Value, Value, &Evaluator<'_>) -> Result<Value, EvalError>,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(eval_kernel(kernel, left, right), Ok(expected));
    }

    #[test]
    fn test_modulus_keeps_dividend_sign() {
        let result = eval_kernel(
            modulus,
            Value::NumberArray(vec![-5.5, 5.5]),
            Value::Number(2.0),
        )
        .unwrap();
        assert_eq!(result, Value::NumberArray(vec![-1.5, 1.5]));
    }

    #[rstest]
    #[case(gt, Value::Number(2.0), Value::Number(1.0), Value::Bool(true))]
    #[case(gte, Value::Number(2.0), Value::Number(2.0), Value::Bool(true))]
    #[case(lt, Value::Number(2.0), Value::Number(1.0), Value::Bool(false))]
    #[case(lte, Value::Number(2.0), Value::Number(2.0), Value::Bool(true))]
    #[case(
        gt,
        Value::NumberArray(vec![-1.0, 2.0]),
        Value::Number(0.0),
        Value::BoolArray(vec![false, true])
    )]
    #[case(
        lte,
        Value::Number(1.5),
        Value::NumberArray(vec![1.0, 2.0]),
        Value::BoolArray(vec![false, true])
    )]
    #[case(
        gt,
        Value::String("b".to_string()),
        Value::String("a".to_string()),
        Value::Bool(true)
    )]
    #[case(
        lte,
        Value::String("abc".to_string()),
        Value::String("abd".to_string()),
        Value::Bool(true)
    )]
    fn test_comparators(
        #[case] kernel: fn(Value, Value, &Evaluator<'_>) -> Result<Value, EvalError>,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(eval_kernel(kernel, left, right), Ok(expected));
    }

    #[rstest]
    #[case(equal, Value::Number(2.0), Value::Number(2.0), Value::Bool(true))]
    #[case(not_equal, Value::Number(2.0), Value::Number(2.0), Value::Bool(false))]
    #[case(
        equal,
        Value::NumberArray(vec![1.0, 2.0]),
        Value::Number(2.0),
        Value::BoolArray(vec![false, true])
    )]
    #[case(
        equal,
        Value::String("a".to_string()),
        Value::String("a".to_string()),
        Value::Bool(true)
    )]
    #[case(
        not_equal,
        Value::String("a".to_string()),
        Value::String("b".to_string()),
        Value::Bool(true)
    )]
    fn test_equality(
        #[case] kernel: fn(Value, Value, &Evaluator<'_>) -> Result<Value, EvalError>,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(eval_kernel(kernel, left, right), Ok(expected));
    }

    #[test]
    fn test_equality_rejects_mixed_string_and_number() {
        assert_eq!(
            eval_kernel(equal, Value::String("1".to_string()), Value::Number(1.0)),
            Err(EvalError::InvalidOperand { operator: "==" })
        );
    }

    #[rstest]
    #[case(and, Value::Bool(true), Value::Bool(false), Value::Bool(false))]
    #[case(or, Value::Bool(false), Value::Bool(true), Value::Bool(true))]
    #[case(
        and,
        Value::BoolArray(vec![true, false]),
        Value::Bool(true),
        Value::BoolArray(vec![true, false])
    )]
    #[case(
        or,
        Value::Bool(false),
        Value::BoolArray(vec![true, false]),
        Value::BoolArray(vec![true, false])
    )]
    #[case(
        and,
        Value::BoolArray(vec![true, true]),
        Value::BoolArray(vec![true, false]),
        Value::BoolArray(vec![true, false])
    )]
    fn test_logical(
        #[case] kernel: fn(Value, Value, &Evaluator<'_>) -> Result<Value, EvalError>,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(eval_kernel(kernel, left, right), Ok(expected));
    }

    #[test]
    fn test_logical_shape_mismatch() {
        assert_eq!(
            eval_kernel(
                and,
                Value::BoolArray(vec![true]),
                Value::BoolArray(vec![true, false])
            ),
            Err(EvalError::ShapeMismatch { left: 1, right: 2 })
        );
    }

    #[rstest]
    #[case(negate, Value::Number(2.0), Value::Number(-2.0))]
    #[case(
        negate,
        Value::NumberArray(vec![1.0, -2.0]),
        Value::NumberArray(vec![-1.0, 2.0])
    )]
    #[case(invert, Value::Bool(true), Value::Bool(false))]
    #[case(
        invert,
        Value::BoolArray(vec![true, false]),
        Value::BoolArray(vec![false, true])
    )]
    #[case(bitwise_not, Value::Number(0.0), Value::Number(-1.0))]
    #[case(
        bitwise_not,
        Value::NumberArray(vec![0.0, 5.0]),
        Value::NumberArray(vec![-1.0, -6.0])
    )]
    fn test_prefix(
        #[case] kernel: fn(Value, Value, &Evaluator<'_>) -> Result<Value, EvalError>,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(eval_kernel(kernel, Value::None, right), Ok(expected));
    }

    #[test]
    fn test_prefix_invalid_operand() {
        assert_eq!(
            eval_kernel(negate, Value::None, Value::Bool(true)),
            Err(EvalError::InvalidOperand { operator: "-" })
        );
        assert_eq!(
            eval_kernel(invert, Value::None, Value::Number(1.0)),
            Err(EvalError::InvalidOperand { operator: "!" })
        );
    }

    #[rstest]
    #[case(bitwise_or, Value::Number(5.0), Value::Number(3.0), Value::Number(7.0))]
    #[case(bitwise_and, Value::Number(5.0), Value::Number(3.0), Value::Number(1.0))]
    #[case(bitwise_xor, Value::Number(5.0), Value::Number(3.0), Value::Number(6.0))]
    #[case(left_shift, Value::Number(1.0), Value::Number(4.0), Value::Number(16.0))]
    #[case(right_shift, Value::Number(16.0), Value::Number(2.0), Value::Number(4.0))]
    #[case(left_shift, Value::Number(1.0), Value::Number(70.0), Value::Number(0.0))]
    #[case(right_shift, Value::Number(16.0), Value::Number(70.0), Value::Number(0.0))]
    #[case(
        bitwise_or,
        Value::NumberArray(vec![1.0, 2.0]),
        Value::Number(4.0),
        Value::NumberArray(vec![5.0, 6.0])
    )]
    #[case(
        left_shift,
        Value::Number(1.0),
        Value::NumberArray(vec![1.0, 2.0, 3.0]),
        Value::NumberArray(vec![2.0, 4.0, 8.0])
    )]
    fn test_bitwise(
        #[case] kernel: fn(Value, Value, &Evaluator<'_>) -> Result<Value, EvalError>,
        #[case] left: Value,
        #[case] right: Value,
        #[case] expected: Value,
    ) {
        assert_eq!(eval_kernel(kernel, left, right), Ok(expected));
    }

    #[rstest]
    #[case(
        Value::BoolArray(vec![true, false, true]),
        Value::NumberArray(vec![1.0, 2.0, 3.0]),
        Value::NumberArray(vec![1.0, f32::MIN_POSITIVE, 3.0])
    )]
    #[case(
        Value::BoolArray(vec![true, false]),
        Value::Number(9.0),
        Value::NumberArray(vec![9.0, f32::MIN_POSITIVE])
    )]
    #[case(
        Value::Bool(true),
        Value::NumberArray(vec![1.0, 2.0]),
        Value::NumberArray(vec![1.0, 2.0])
    )]
    #[case(Value::Bool(true), Value::Number(7.0), Value::Number(7.0))]
    #[case(Value::Bool(false), Value::Number(7.0), Value::Number(f32::MIN_POSITIVE))]
    fn test_ternary_if(#[case] cond: Value, #[case] value: Value, #[case] expected: Value) {
        assert_eq!(eval_kernel(ternary_if, cond, value), Ok(expected));
    }

    #[rstest]
    #[case(
        Value::NumberArray(vec![1.0, f32::MIN_POSITIVE, 3.0]),
        Value::NumberArray(vec![9.0, 8.0, 7.0]),
        Value::NumberArray(vec![1.0, 8.0, 3.0])
    )]
    #[case(
        Value::NumberArray(vec![f32::MIN_POSITIVE, 2.0]),
        Value::Number(0.0),
        Value::NumberArray(vec![0.0, 2.0])
    )]
    #[case(
        Value::Number(f32::MIN_POSITIVE),
        Value::NumberArray(vec![4.0, 5.0]),
        Value::NumberArray(vec![4.0, 5.0])
    )]
    #[case(Value::Number(f32::MIN_POSITIVE), Value::Number(3.0), Value::Number(3.0))]
    #[case(Value::Number(2.0), Value::Number(3.0), Value::Number(2.0))]
    #[case(Value::None, Value::Number(3.0), Value::Number(3.0))]
    #[case(Value::None, Value::NumberArray(vec![1.0, 2.0]), Value::NumberArray(vec![1.0, 2.0]))]
    fn test_ternary_else(#[case] value: Value, #[case] alternative: Value, #[case] expected: Value) {
        assert_eq!(eval_kernel(ternary_else, value, alternative), Ok(expected));
    }

    #[test]
    fn test_ternary_respects_nodata_override() {
        let params = MapParameters::new().with(NO_DATA_PARAMETER, -1.0f32);
        let result = eval_kernel_with(
            ternary_if,
            Value::BoolArray(vec![false, true]),
            Value::Number(5.0),
            &params,
        )
        .unwrap();
        assert_eq!(result, Value::NumberArray(vec![-1.0, 5.0]));

        let replaced = eval_kernel_with(
            ternary_else,
            Value::NumberArray(vec![-1.0, 5.0]),
            Value::Number(0.0),
            &params,
        )
        .unwrap();
        assert_eq!(replaced, Value::NumberArray(vec![0.0, 5.0]));
    }

    #[test]
    fn test_ternary_rejects_invalid_nodata() {
        let params = MapParameters::new().with(NO_DATA_PARAMETER, "bad");
        assert!(matches!(
            eval_kernel_with(ternary_if, Value::Bool(true), Value::Number(1.0), &params),
            Err(EvalError::InvalidNoData(_))
        ));
    }

    #[rstest]
    #[case("foo", "f.*", true)]
    #[case("foo", "^o", false)]
    #[case("tile_12", r"tile_\d+", true)]
    fn test_regex_match(#[case] subject: &str, #[case] pattern: &str, #[case] expected: bool) {
        assert_eq!(
            eval_kernel(regex_match, Value::from(subject), Value::from(pattern)),
            Ok(Value::Bool(expected))
        );
        assert_eq!(
            eval_kernel(not_regex_match, Value::from(subject), Value::from(pattern)),
            Ok(Value::Bool(!expected))
        );
    }

    #[test]
    fn test_regex_match_with_precompiled_pattern() {
        let pattern = Regex::new("^a+$").unwrap();
        assert_eq!(
            eval_kernel(regex_match, Value::from("aaa"), Value::Regex(pattern)),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_regex_match_invalid_pattern() {
        assert!(matches!(
            eval_kernel(regex_match, Value::from("a"), Value::from("(")),
            Err(EvalError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_separator_builds_lists() {
        let pair = eval_kernel(separator, Value::Number(1.0), Value::Number(2.0)).unwrap();
        assert_eq!(
            pair,
            Value::List(vec![Value::Number(1.0), Value::Number(2.0)])
        );

        let triple = eval_kernel(separator, pair, Value::Number(3.0)).unwrap();
        assert_eq!(
            triple,
            Value::List(vec![
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Number(3.0)
            ])
        );
    }

    #[rstest]
    #[case(Value::Number(5.0), true)]
    #[case(Value::Number(4.0), false)]
    #[case(Value::String("a".to_string()), false)]
    fn test_in_list(#[case] needle: Value, #[case] expected: bool) {
        let list = Value::List(vec![
            Value::Number(1.0),
            Value::Number(3.0),
            Value::Number(5.0),
            Value::Number(7.0),
        ]);
        assert_eq!(
            eval_kernel(in_list, needle, list),
            Ok(Value::Bool(expected))
        );
    }

    #[test]
    fn test_in_requires_a_list() {
        assert_eq!(
            eval_kernel(in_list, Value::Number(1.0), Value::Number(1.0)),
            Err(EvalError::InvalidOperand { operator: "in" })
        );
    }

    #[rstest]
    #[case(Value::Number(1.0), Value::Number(2.0), Value::Number(1.0))]
    #[case(Value::None, Value::Number(2.0), Value::Number(2.0))]
    fn test_coalesce(#[case] left: Value, #[case] right: Value, #[case] expected: Value) {
        assert_eq!(eval_kernel(coalesce, left, right), Ok(expected));
    }

    #[test]
    fn test_noop_right_passes_through() {
        assert_eq!(
            eval_kernel(noop_right, Value::Number(1.0), Value::Number(2.0)),
            Ok(Value::Number(2.0))
        );
    }
}
