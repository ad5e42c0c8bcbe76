//! Example-based fitness with a simplicity bias.

use std::cmp::Ordering;

use maple_synth_types::{Evaluator, Expression, IOExample, PrimitiveTable};
use serde::{Deserialize, Serialize};

/// How well an individual fits the examples.
///
/// Ordered so that greater is better: more satisfied examples first, then
/// smaller weighted size, then fewer evaluation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fitness {
    pub satisfied: usize,
    pub total: usize,
    pub size: usize,
    pub failures: usize,
}

impl Fitness {
    pub fn evaluate(
        expr: &Expression,
        examples: &[IOExample],
        evaluator: &Evaluator<'_>,
        table: &dyn PrimitiveTable,
    ) -> Self {
        let mut satisfied = 0;
        let mut failures = 0;
        for ex in examples {
            match evaluator.eval(expr, &ex.inputs) {
                Ok(v) if v == ex.output => satisfied += 1,
                Ok(_) => {}
                Err(_) => failures += 1,
            }
        }
        Self {
            satisfied,
            total: examples.len(),
            size: expr.size(table),
            failures,
        }
    }

    /// Fraction of examples satisfied.
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.satisfied as f64 / self.total as f64
    }

    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.satisfied == self.total
    }
}

impl Ord for Fitness {
    fn cmp(&self, other: &Self) -> Ordering {
        self.satisfied
            .cmp(&other.satisfied)
            .then_with(|| other.size.cmp(&self.size))
            .then_with(|| other.failures.cmp(&self.failures))
    }
}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Fitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} (size {}, {} failures)",
            self.satisfied, self.total, self.size, self.failures
        )
    }
}
