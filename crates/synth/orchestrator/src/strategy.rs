//! Pluggable search strategies.
//!
//! The set of strategies is closed and registered up front. The
//! meta-learner only reorders them; it never creates new ones.

use maple_synth_enumerator::Enumerator;
use maple_synth_genetic::GeneticEngine;
use maple_synth_types::{Expression, IOExample, PrimitiveTable, SynthError, SynthResult, SynthesisConfig};
use tracing::debug;

/// A program proposed by a strategy, not yet verified.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub expression: Expression,
    pub size: usize,
    /// Whether the strategy observed it matching every example.
    pub exact: bool,
}

/// A synthesis algorithm the orchestrator can run.
pub trait SynthesisStrategy: Send + Sync {
    /// Stable name used as the meta-learner's strategy id.
    fn name(&self) -> &str;

    /// Search for a program within `config.time_budget_per_strategy`.
    ///
    /// Returns [`SynthError::SynthesisExhausted`] when the budget runs out
    /// without a candidate. With `config.best_effort` a strategy may return
    /// an inexact candidate instead.
    fn attempt(
        &self,
        table: &dyn PrimitiveTable,
        examples: &[IOExample],
        config: &SynthesisConfig,
    ) -> SynthResult<Candidate>;
}

// ── Enumerative ─────────────────────────────────────────────────────

/// Bottom-up enumeration with observational-equivalence pruning.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumerativeStrategy;

impl SynthesisStrategy for EnumerativeStrategy {
    fn name(&self) -> &str {
        "enumerative"
    }

    fn attempt(
        &self,
        table: &dyn PrimitiveTable,
        examples: &[IOExample],
        config: &SynthesisConfig,
    ) -> SynthResult<Candidate> {
        let result = Enumerator::new(table, config).synthesize(
            examples,
            config.max_size,
            config.time_budget_per_strategy,
        )?;
        debug!(
            levels = result.stats.levels_completed,
            candidates = result.stats.candidates,
            pruned = result.stats.pruned_equivalent,
            "Enumerative attempt finished"
        );
        match result.solution {
            Some(s) => Ok(Candidate {
                expression: s.expression,
                size: s.size,
                exact: true,
            }),
            None => Err(SynthError::SynthesisExhausted(format!(
                "enumeration stopped by {} after {} candidates",
                result
                    .stats
                    .exhausted_by
                    .map_or_else(|| "an unknown limit".to_string(), |e| e.to_string()),
                result.stats.candidates
            ))),
        }
    }
}

// ── Genetic ─────────────────────────────────────────────────────────

/// Seeded genetic programming.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeneticStrategy;

impl SynthesisStrategy for GeneticStrategy {
    fn name(&self) -> &str {
        "genetic"
    }

    fn attempt(
        &self,
        table: &dyn PrimitiveTable,
        examples: &[IOExample],
        config: &SynthesisConfig,
    ) -> SynthResult<Candidate> {
        let result = GeneticEngine::new(table, config.clone())
            .evolve(examples, config.time_budget_per_strategy)?;
        debug!(
            generations = result.generations_run,
            best = %result.best.fitness,
            terminated_by = ?result.terminated_by,
            "Genetic attempt finished"
        );
        let exact = result.is_perfect();
        if !exact && !config.best_effort {
            return Err(SynthError::SynthesisExhausted(format!(
                "best fitness {} after {} generations",
                result.best.fitness, result.generations_run
            )));
        }
        Ok(Candidate {
            size: result.best.expression.size(table),
            expression: result.best.expression,
            exact,
        })
    }
}

/// The strategies every orchestrator starts with, in registration order.
pub fn default_strategies() -> Vec<Box<dyn SynthesisStrategy>> {
    vec![Box::new(EnumerativeStrategy), Box::new(GeneticStrategy)]
}
