#![deny(unsafe_code)]
//! # maple-synth-genetic
//!
//! Population-based program search. A run moves through
//! `Init → Evaluate → Select → Reproduce → Evaluate → … → Terminate`:
//! a ramped half-and-half initial population, tournament selection,
//! typed subtree crossover, point/subtree/hoist mutation and elitism.
//! All random choices flow from one seeded [`rand::rngs::StdRng`].

pub mod engine;
pub mod fitness;
pub mod generate;
pub mod operators;

pub use engine::{EvolutionResult, GenerationStats, GeneticEngine, Individual, Population, Termination};
pub use fitness::Fitness;
pub use generate::{Method, TreeGenerator};
pub use operators::{crossover, mutate, MutationKind};
