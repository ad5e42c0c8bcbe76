//! Shared fixtures for the cross-crate property and end-to-end tests.

use std::time::Duration;

use maple_synth_registry::CapabilityRegistry;
use maple_synth_types::{Builtin, IOExample, PrimitiveId, SynthesisConfig};

/// Vocabulary for the completeness properties. Ids follow this order.
pub const ARITHMETIC: [Builtin; 4] = [Builtin::Add, Builtin::Sub, Builtin::Mul, Builtin::Neg];

pub const ADD: PrimitiveId = PrimitiveId(0);
pub const SUB: PrimitiveId = PrimitiveId(1);
pub const MUL: PrimitiveId = PrimitiveId(2);
pub const NEG: PrimitiveId = PrimitiveId(3);

pub fn arithmetic_registry() -> CapabilityRegistry {
    CapabilityRegistry::from_builtins(&ARITHMETIC)
}

/// `f(x)` sampled at each `x`.
pub fn unary_examples(xs: impl IntoIterator<Item = i64>, f: impl Fn(i64) -> i64) -> Vec<IOExample> {
    xs.into_iter().map(|x| IOExample::ints(&[x], f(x))).collect()
}

/// `f(x, y)` sampled at each pair.
pub fn binary_examples(pairs: &[(i64, i64)], f: impl Fn(i64, i64) -> i64) -> Vec<IOExample> {
    pairs.iter().map(|&(x, y)| IOExample::ints(&[x, y], f(x, y))).collect()
}

/// Budgets generous enough that wall-clock time never decides an outcome
/// in tests.
pub fn test_config() -> SynthesisConfig {
    SynthesisConfig::default()
        .with_time_budget(Duration::from_secs(30))
        .with_exploration_rate(0.0)
}

/// A small, fast genetic configuration.
pub fn small_genetic_config(seed: u64) -> SynthesisConfig {
    test_config().with_population(16, 8).with_seed(seed)
}
