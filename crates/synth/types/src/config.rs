//! Synthesis configuration.
//!
//! One [`SynthesisConfig`] drives every strategy. Per-call
//! [`Constraints`] narrow it for a single request.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};
use crate::eval::EvalLimits;

/// Configuration shared by the search strategies and the verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Largest weighted expression size the enumerator explores.
    pub max_size: usize,

    /// Deepest tree the genetic engine builds or keeps.
    pub max_depth: usize,

    /// Individuals per generation.
    pub population_size: usize,

    /// Generation limit.
    pub generations: usize,

    /// Probability that an offspring is mutated (0.0-1.0).
    pub mutation_rate: f64,

    /// Probability that two parents are recombined (0.0-1.0).
    pub crossover_rate: f64,

    /// Tournament size for parent selection.
    pub tournament_size: usize,

    /// Best individuals copied unchanged into the next generation.
    pub elitism_count: usize,

    /// Wall-clock budget for one strategy attempt.
    pub time_budget_per_strategy: Duration,

    /// Maximum number of `if` branch assignments explored per program.
    pub path_exploration_budget: usize,

    /// Maximum iterations of a `fix` application.
    pub fix_iteration_cap: usize,

    /// Seed for every random choice.
    pub seed: u64,

    /// Integer literals available as terminals.
    pub int_constants: Vec<i64>,

    /// Hard cap on candidates the enumerator may construct.
    pub max_candidates: usize,

    /// Probability that the meta-learner promotes its least-tried strategy.
    pub exploration_rate: f64,

    /// Maximum probe tuples used by dedup and the termination check.
    pub probe_limit: usize,

    /// Accept the best partial genetic candidate when nothing is exact.
    pub best_effort: bool,

    /// Maximum solve records and attempt outcomes kept (bounded FIFO).
    pub max_tracked_records: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_size: 7,
            max_depth: 3,
            population_size: 64,
            generations: 40,
            mutation_rate: 0.3,
            crossover_rate: 0.8,
            tournament_size: 4,
            elitism_count: 2,
            time_budget_per_strategy: Duration::from_secs(2),
            path_exploration_budget: 64,
            fix_iteration_cap: 100,
            seed: 42,
            int_constants: vec![0, 1, 2],
            max_candidates: 2_000_000,
            exploration_rate: 0.1,
            probe_limit: 64,
            best_effort: false,
            max_tracked_records: 256,
        }
    }
}

impl SynthesisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> SynthResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SynthError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_population(mut self, population_size: usize, generations: usize) -> Self {
        self.population_size = population_size;
        self.generations = generations;
        self
    }

    pub fn with_rates(mut self, mutation_rate: f64, crossover_rate: f64) -> Self {
        self.mutation_rate = mutation_rate;
        self.crossover_rate = crossover_rate;
        self
    }

    pub fn with_selection(mut self, tournament_size: usize, elitism_count: usize) -> Self {
        self.tournament_size = tournament_size;
        self.elitism_count = elitism_count;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_per_strategy = budget;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_int_constants(mut self, constants: Vec<i64>) -> Self {
        self.int_constants = constants;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn with_exploration_rate(mut self, rate: f64) -> Self {
        self.exploration_rate = rate;
        self
    }

    pub fn with_best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = best_effort;
        self
    }

    pub fn with_max_tracked_records(mut self, max_tracked_records: usize) -> Self {
        self.max_tracked_records = max_tracked_records;
        self
    }

    /// Evaluation bounds derived from this configuration.
    pub fn eval_limits(&self) -> EvalLimits {
        EvalLimits {
            fix_iteration_cap: self.fix_iteration_cap,
            ..EvalLimits::default()
        }
    }

    /// Apply per-call overrides, returning a new configuration.
    pub fn constrained(&self, constraints: &Constraints) -> Self {
        let mut config = self.clone();
        if let Some(max_size) = constraints.max_size {
            config.max_size = max_size;
        }
        if let Some(max_depth) = constraints.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(budget) = constraints.time_budget_per_strategy {
            config.time_budget_per_strategy = budget;
        }
        if let Some(best_effort) = constraints.best_effort {
            config.best_effort = best_effort;
        }
        config
    }

    /// Reject budgets and GA parameters that cannot drive a search.
    pub fn validate(&self) -> SynthResult<()> {
        let positive = [
            ("max_size", self.max_size),
            ("max_depth", self.max_depth),
            ("population_size", self.population_size),
            ("generations", self.generations),
            ("tournament_size", self.tournament_size),
            ("path_exploration_budget", self.path_exploration_budget),
            ("fix_iteration_cap", self.fix_iteration_cap),
            ("max_candidates", self.max_candidates),
            ("probe_limit", self.probe_limit),
            ("max_tracked_records", self.max_tracked_records),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SynthError::InvalidConfiguration(format!(
                    "{} must be positive",
                    name
                )));
            }
        }
        if self.time_budget_per_strategy.is_zero() {
            return Err(SynthError::InvalidConfiguration(
                "time_budget_per_strategy must be positive".into(),
            ));
        }
        for (name, rate) in [
            ("mutation_rate", self.mutation_rate),
            ("crossover_rate", self.crossover_rate),
            ("exploration_rate", self.exploration_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(SynthError::InvalidConfiguration(format!(
                    "{} must lie in [0, 1], got {}",
                    name, rate
                )));
            }
        }
        if self.elitism_count >= self.population_size {
            return Err(SynthError::InvalidConfiguration(format!(
                "elitism_count ({}) must be below population_size ({})",
                self.elitism_count, self.population_size
            )));
        }
        if self.tournament_size > self.population_size {
            return Err(SynthError::InvalidConfiguration(format!(
                "tournament_size ({}) exceeds population_size ({})",
                self.tournament_size, self.population_size
            )));
        }
        Ok(())
    }
}

/// Per-call overrides for one synthesis request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub max_size: Option<usize>,
    pub max_depth: Option<usize>,
    pub time_budget_per_strategy: Option<Duration>,
    pub best_effort: Option<bool>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_per_strategy = Some(budget);
        self
    }

    pub fn with_best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = Some(best_effort);
        self
    }
}
