//! The evolution loop: initialise, evaluate, select, reproduce.

use std::time::{Duration, Instant};

use maple_synth_types::{
    Evaluator, Expression, IOExample, PrimitiveTable, ProblemSignature, SynthError, SynthResult,
    SynthesisConfig, Type,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fitness::Fitness;
use crate::generate::{Method, TreeGenerator};
use crate::operators::{crossover, mutate, MutationKind};

// ── Population ──────────────────────────────────────────────────────

/// One candidate program with its fitness on the examples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Individual {
    pub expression: Expression,
    pub fitness: Fitness,
}

/// Fixed-size collection of individuals for one evolution run.
#[derive(Debug, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Best individual; the earliest wins ties.
    pub fn best(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .reduce(|best, i| if i.fitness > best.fitness { i } else { best })
    }

    pub fn mean_score(&self) -> f64 {
        if self.individuals.is_empty() {
            return 0.0;
        }
        self.individuals.iter().map(|i| i.fitness.score()).sum::<f64>() / self.individuals.len() as f64
    }

    /// Best first; stable, so equal individuals keep their order.
    fn sort(&mut self) {
        self.individuals.sort_by(|a, b| b.fitness.cmp(&a.fitness));
    }
}

// ── Run results ─────────────────────────────────────────────────────

/// Per-generation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: f64,
    pub mean: f64,
    pub best_size: usize,
}

/// Why an evolution run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    Perfect,
    GenerationLimit,
    TimeBudget,
}

/// Outcome of one evolution run.
#[derive(Debug, Clone)]
pub struct EvolutionResult {
    /// Best individual ever seen. Perfect example fitness does not imply
    /// generalisation; callers re-verify.
    pub best: Individual,
    pub generations_run: usize,
    pub history: Vec<GenerationStats>,
    pub terminated_by: Termination,
}

impl EvolutionResult {
    pub fn is_perfect(&self) -> bool {
        self.best.fitness.is_perfect()
    }
}

// ── Engine ──────────────────────────────────────────────────────────

/// Seeded genetic-programming search over one primitive table.
pub struct GeneticEngine<'t> {
    table: &'t dyn PrimitiveTable,
    config: SynthesisConfig,
}

impl<'t> GeneticEngine<'t> {
    pub fn new(table: &'t dyn PrimitiveTable, config: SynthesisConfig) -> Self {
        Self { table, config }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Build `population_size` random well-typed trees of the problem's
    /// output type, ramped over depths `1..=max_depth`, alternating the
    /// grow and full methods.
    ///
    /// Generation is retried up to `4 * population_size` times. A short
    /// but non-empty population is padded with copies of generated trees;
    /// an empty one is returned as is.
    pub fn initialize_population(
        &self,
        generator: &TreeGenerator<'_>,
        output: &Type,
        examples: &[IOExample],
        rng: &mut impl Rng,
    ) -> Population {
        let evaluator = Evaluator::new(self.table, self.config.eval_limits());
        let max_depth = self.config.max_depth.max(1);
        let mut individuals = Vec::with_capacity(self.config.population_size);
        let mut attempts = 0;
        while individuals.len() < self.config.population_size && attempts < self.config.population_size * 4 {
            let i = attempts;
            attempts += 1;
            let depth = 1 + i % max_depth;
            let method = if i % 2 == 0 { Method::Grow } else { Method::Full };
            if let Some(expression) = generator.generate(output, depth, method, rng) {
                let fitness = Fitness::evaluate(&expression, examples, &evaluator, self.table);
                individuals.push(Individual { expression, fitness });
            }
        }

        let generated = individuals.len();
        if generated > 0 && generated < self.config.population_size {
            warn!(
                requested = self.config.population_size,
                generated,
                output = %output,
                "Initial population short, padding with copies"
            );
            while individuals.len() < self.config.population_size {
                let copy = individuals[rng.gen_range(0..generated)].clone();
                individuals.push(copy);
            }
        }
        Population { individuals }
    }

    /// Evolve a program for `examples` within `time_budget`.
    pub fn evolve(&self, examples: &[IOExample], time_budget: Duration) -> SynthResult<EvolutionResult> {
        self.config.validate()?;
        let signature = ProblemSignature::infer(examples)?;
        if self.table.is_empty() {
            return Err(SynthError::InvalidConfiguration("primitive table is empty".into()));
        }

        let deadline = Instant::now().checked_add(time_budget);
        let out_of_time = || deadline.is_some_and(|d| Instant::now() >= d);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let generator = TreeGenerator::new(self.table, &signature.inputs, &self.config.int_constants);
        let evaluator = Evaluator::new(self.table, self.config.eval_limits());

        let mut population = self.initialize_population(&generator, &signature.output, examples, &mut rng);
        let Some(first) = population.best().cloned() else {
            return Err(SynthError::InvalidConfiguration(format!(
                "no primitive or terminal produces {}",
                signature.output
            )));
        };
        let mut best_ever = first;
        let mut history = vec![self.summarise(0, &population)];

        let mut generation = 0;
        let terminated_by = loop {
            if best_ever.fitness.is_perfect() {
                break Termination::Perfect;
            }
            if generation >= self.config.generations {
                break Termination::GenerationLimit;
            }
            if out_of_time() {
                warn!(generation, best = %best_ever.fitness, "Evolution time budget exhausted");
                break Termination::TimeBudget;
            }

            generation += 1;
            population = self.next_generation(population, &generator, &signature.inputs, examples, &evaluator, &mut rng);
            if let Some(best) = population.best() {
                if best.fitness > best_ever.fitness {
                    best_ever = best.clone();
                }
            }
            let stats = self.summarise(generation, &population);
            debug!(
                generation,
                best = stats.best,
                mean = stats.mean,
                best_size = stats.best_size,
                "Generation evaluated"
            );
            history.push(stats);
        };

        debug!(
            generations = generation,
            terminated_by = ?terminated_by,
            best = %best_ever.fitness,
            program = %best_ever.expression.render(self.table),
            "Evolution finished"
        );

        Ok(EvolutionResult {
            best: best_ever,
            generations_run: generation,
            history,
            terminated_by,
        })
    }

    fn next_generation(
        &self,
        mut population: Population,
        generator: &TreeGenerator<'_>,
        inputs: &[Type],
        examples: &[IOExample],
        evaluator: &Evaluator<'_>,
        rng: &mut impl Rng,
    ) -> Population {
        let size = population.len();
        population.sort();

        let mut next: Vec<Individual> = population
            .individuals
            .iter()
            .take(self.config.elitism_count)
            .cloned()
            .collect();

        while next.len() < size {
            let a = self.tournament(&population, rng);
            let b = self.tournament(&population, rng);
            let (child_a, child_b) = if rng.gen_bool(self.config.crossover_rate) {
                crossover(&a.expression, &b.expression, generator, inputs, rng)
            } else {
                (a.expression.clone(), b.expression.clone())
            };

            for (child, parent) in [(child_a, a), (child_b, b)] {
                if next.len() >= size {
                    break;
                }
                let child = if rng.gen_bool(self.config.mutation_rate) {
                    let kind = *MutationKind::ALL.choose(rng).unwrap_or(&MutationKind::Point);
                    mutate(&child, kind, generator, inputs, self.config.max_depth, rng)
                } else {
                    child
                };
                if child.depth() > self.config.max_depth {
                    next.push(parent.clone());
                    continue;
                }
                let fitness = Fitness::evaluate(&child, examples, evaluator, self.table);
                next.push(Individual {
                    expression: child,
                    fitness,
                });
            }
        }

        Population { individuals: next }
    }

    /// Best of `tournament_size` uniformly drawn individuals.
    fn tournament<'p>(&self, population: &'p Population, rng: &mut impl Rng) -> &'p Individual {
        let n = population.len();
        let mut winner = rng.gen_range(0..n);
        for _ in 1..self.config.tournament_size {
            let challenger = rng.gen_range(0..n);
            let better = population.individuals[challenger].fitness > population.individuals[winner].fitness;
            if better || (challenger < winner && population.individuals[challenger].fitness == population.individuals[winner].fitness) {
                winner = challenger;
            }
        }
        &population.individuals[winner]
    }

    fn summarise(&self, generation: usize, population: &Population) -> GenerationStats {
        let (best, best_size) = population
            .best()
            .map(|b| (b.fitness.score(), b.fitness.size))
            .unwrap_or((0.0, 0));
        GenerationStats {
            generation,
            best,
            mean: population.mean_score(),
            best_size,
        }
    }
}
