//! Property-based tests for the evaluation invariants: determinism, the
//! broadcasting law, short-circuit safety, canonicalization idempotence,
//! ternary identity and the regex round-trip.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use vexpr::{Expression, Functions, MapParameters, Value};

mod strategies {
    use super::*;

    /// Finite scalars away from zero, so division never manufactures NaN
    /// lanes from `0/0` and results stay bitwise-comparable.
    pub fn scalar() -> impl Strategy<Value = f32> {
        prop_oneof![1.0f32..1.0e3, -1.0e3..-1.0f32]
    }

    pub fn vector() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(scalar(), 1..16)
    }

    pub fn mask(len: usize) -> impl Strategy<Value = Vec<bool>> {
        prop::collection::vec(any::<bool>(), len..=len)
    }

    /// Literal-only patterns, guaranteed to compile.
    pub fn pattern() -> impl Strategy<Value = String> {
        "[a-z]{1,4}"
    }

    pub fn subject() -> impl Strategy<Value = String> {
        "[a-z]{0,8}"
    }
}

fn number_array(value: Value) -> Vec<f32> {
    match value {
        Value::NumberArray(values) => values,
        other => panic!("expected a number array, got {:?}", other),
    }
}

proptest! {
    #[test]
    fn determinism(a in strategies::scalar(), b in strategies::scalar()) {
        let expression = Expression::new("a * b + a").unwrap();
        let params = MapParameters::new().with("a", a).with("b", b);
        let first = expression.evaluate(&params).unwrap();
        let second = expression.evaluate(&params).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn broadcasting_law(
        v in strategies::vector(),
        s in strategies::scalar(),
        op in prop::sample::select(vec!["+", "-", "*", "/"]),
    ) {
        let lane = |a: f32, b: f32| match op {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" => a / b,
            _ => unreachable!(),
        };
        let params = MapParameters::new().with("v", v.clone()).with("s", s);

        let right = Expression::new(&format!("v {op} s")).unwrap();
        let result = number_array(right.evaluate(&params).unwrap());
        prop_assert_eq!(result.len(), v.len());
        for (i, value) in result.iter().enumerate() {
            prop_assert_eq!(value.to_bits(), lane(v[i], s).to_bits());
        }

        let left = Expression::new(&format!("s {op} v")).unwrap();
        let result = number_array(left.evaluate(&params).unwrap());
        for (i, value) in result.iter().enumerate() {
            prop_assert_eq!(value.to_bits(), lane(s, v[i]).to_bits());
        }
    }

    #[test]
    fn short_circuit_has_no_observable_effect(cond in any::<bool>()) {
        let calls = Arc::new(AtomicUsize::new(0));
        let recorded = Arc::clone(&calls);
        let functions = Functions::new().with("probe", move |_: &[Value]| {
            recorded.fetch_add(1, Ordering::SeqCst);
            Ok(Value::TRUE)
        });

        let expression = Expression::with_functions("c && probe()", &functions).unwrap();
        let params = MapParameters::new().with("c", cond);
        expression.evaluate(&params).unwrap();
        prop_assert_eq!(calls.load(Ordering::SeqCst), usize::from(cond));

        let expression = Expression::with_functions("c || probe()", &functions).unwrap();
        calls.store(0, Ordering::SeqCst);
        expression.evaluate(&params).unwrap();
        prop_assert_eq!(calls.load(Ordering::SeqCst), usize::from(!cond));
    }

    #[test]
    fn canonicalization_idempotence(x in -1_000_000i64..1_000_000) {
        let expression = Expression::new("x").unwrap();

        let as_i64 = MapParameters::new().with("x", x);
        let as_i32 = MapParameters::new().with("x", x as i32);
        let as_f32 = MapParameters::new().with("x", x as f32);
        let as_f64 = MapParameters::new().with("x", x as f64);

        let expected = expression.evaluate(&as_f32).unwrap();
        prop_assert_eq!(expression.evaluate(&as_i64).unwrap(), expected.clone());
        prop_assert_eq!(expression.evaluate(&as_i32).unwrap(), expected.clone());
        prop_assert_eq!(expression.evaluate(&as_f64).unwrap(), expected);
    }

    #[test]
    fn ternary_identity_vectorized(
        (cond, a, b) in strategies::vector().prop_flat_map(|a| {
            let len = a.len();
            (strategies::mask(len), Just(a), prop::collection::vec(strategies::scalar(), len..=len))
        })
    ) {
        let expression = Expression::new("c ? a : b").unwrap();
        let params = MapParameters::new()
            .with("c", cond.clone())
            .with("a", a.clone())
            .with("b", b.clone());

        let result = number_array(expression.evaluate(&params).unwrap());
        prop_assert_eq!(result.len(), cond.len());
        for i in 0..cond.len() {
            let expected = if cond[i] { a[i] } else { b[i] };
            prop_assert_eq!(result[i].to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn ternary_identity_scalar_condition(
        cond in any::<bool>(),
        a in strategies::scalar(),
        b in strategies::scalar(),
    ) {
        let expression = Expression::new("c ? a : b").unwrap();
        let params = MapParameters::new().with("c", cond).with("a", a).with("b", b);
        let expected = Value::Number(if cond { a } else { b });
        prop_assert_eq!(expression.evaluate(&params).unwrap(), expected);
    }

    #[test]
    fn ternary_identity_scalar_value_lanes(
        cond in prop::collection::vec(any::<bool>(), 1..16),
        a in strategies::scalar(),
        b in strategies::scalar(),
    ) {
        let expression = Expression::new("c ? a : b").unwrap();
        let params = MapParameters::new().with("c", cond.clone()).with("a", a).with("b", b);
        let result = number_array(expression.evaluate(&params).unwrap());
        for i in 0..cond.len() {
            let expected = if cond[i] { a } else { b };
            prop_assert_eq!(result[i].to_bits(), expected.to_bits());
        }
    }

    #[test]
    fn regex_round_trip(s in strategies::subject(), pattern in strategies::pattern()) {
        let matches = Expression::new("s =~ p").unwrap();
        let not_matches = Expression::new("s !~ p").unwrap();
        let params = MapParameters::new().with("s", s).with("p", pattern);

        let matched = matches.evaluate(&params).unwrap();
        let negated = not_matches.evaluate(&params).unwrap();
        match (matched, negated) {
            (Value::Bool(m), Value::Bool(n)) => prop_assert_eq!(m, !n),
            other => prop_assert!(false, "expected booleans, got {:?}", other),
        }
    }
}
