//! Shared proptest strategies over the arithmetic vocabulary.

use maple_synth_tests::{ADD, MUL, NEG, SUB};
use maple_synth_types::{Expression, IOExample, Value};
use proptest::prelude::*;

/// Leaves: a variable below `arity` or one of the default integer constants.
fn arb_leaf(arity: usize) -> impl Strategy<Value = Expression> {
    prop_oneof![
        (0..arity).prop_map(Expression::var),
        (0i64..3).prop_map(Expression::int),
    ]
}

/// Well-typed integer expressions of depth at most `depth`.
pub fn arb_expression(arity: usize, depth: u32) -> BoxedStrategy<Expression> {
    let leaf = arb_leaf(arity).boxed();
    if depth == 0 {
        return leaf;
    }
    let sub = arb_expression(arity, depth - 1);
    prop_oneof![
        1 => leaf,
        1 => sub.clone().prop_map(|a| Expression::apply(NEG, vec![a])),
        3 => (prop_oneof![Just(ADD), Just(SUB), Just(MUL)], sub.clone(), sub)
            .prop_map(|(op, a, b)| Expression::apply(op, vec![a, b])),
    ]
    .boxed()
}

/// Examples of `y = a*x + b` on `x = 0..5`.
pub fn arb_linear_examples() -> impl Strategy<Value = Vec<IOExample>> {
    (-3i64..=3, -3i64..=3).prop_map(|(a, b)| {
        (0..5).map(|x| IOExample::ints(&[x], a * x + b)).collect()
    })
}

/// Five small integer examples with arbitrary outputs.
pub fn arb_unary_examples() -> impl Strategy<Value = Vec<IOExample>> {
    prop::collection::vec(-20i64..20, 5).prop_map(|outputs| {
        outputs
            .into_iter()
            .enumerate()
            .map(|(x, y)| IOExample::new(vec![Value::Int(x as i64)], Value::Int(y)))
            .collect()
    })
}
