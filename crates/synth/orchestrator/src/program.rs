//! Programs returned to callers.

use std::fmt;

use maple_synth_registry::RegistrySnapshot;
use maple_synth_meta_learner::StrategyId;
use maple_synth_types::{EvalError, EvalLimits, Evaluator, Expression, ProblemSignature, Value};
use maple_synth_verifier::VerificationResult;

/// A synthesized program bound to the primitive table it was found in.
///
/// The table is a frozen registry snapshot, so later capability expansion
/// never changes what this program computes.
#[derive(Debug, Clone)]
pub struct SynthesizedProgram {
    pub expression: Expression,
    /// Human-readable form, e.g. `add(x0, 1)`.
    pub rendering: String,
    pub size: usize,
    pub signature: ProblemSignature,
    /// Strategy that produced the program.
    pub strategy: StrategyId,
    /// `None` when the caller skipped verification.
    pub verification: Option<VerificationResult>,
    table: RegistrySnapshot,
    limits: EvalLimits,
}

impl SynthesizedProgram {
    pub(crate) fn new(
        expression: Expression,
        size: usize,
        signature: ProblemSignature,
        strategy: StrategyId,
        verification: Option<VerificationResult>,
        table: RegistrySnapshot,
        limits: EvalLimits,
    ) -> Self {
        Self {
            rendering: expression.render(&table),
            expression,
            size,
            signature,
            strategy,
            verification,
            table,
            limits,
        }
    }

    /// Run the program on one input tuple.
    pub fn call(&self, inputs: &[Value]) -> Result<Value, EvalError> {
        Evaluator::new(&self.table, self.limits).eval(&self.expression, inputs)
    }

    /// Whether every verification check passed.
    pub fn is_verified(&self) -> bool {
        self.verification.as_ref().is_some_and(|v| v.verified)
    }

    pub fn table(&self) -> &RegistrySnapshot {
        &self.table
    }
}

impl fmt::Display for SynthesizedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [size {}, {}", self.rendering, self.size, self.strategy)?;
        match &self.verification {
            Some(v) => write!(f, ", {}]", v.verdict()),
            None => write!(f, ", unchecked]"),
        }
    }
}
