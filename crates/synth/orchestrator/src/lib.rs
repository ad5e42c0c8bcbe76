#![deny(unsafe_code)]
//! # maple-synth-orchestrator
//!
//! Drives synthesis requests end to end:
//!
//! ```text
//! examples → ProblemFeatures → MetaLearner::rank → strategy.attempt
//!          → Verifier::verify → MetaLearner::record → SynthesizedProgram
//! ```
//!
//! and implements capability expansion: verified programs that are not
//! observationally equivalent to an existing primitive are appended to the
//! [`CapabilityRegistry`](maple_synth_registry::CapabilityRegistry) as
//! `learned_<n>` and become visible to every later search.

pub mod orchestrator;
pub mod program;
pub mod report;
pub mod strategy;

pub use orchestrator::Orchestrator;
pub use program::SynthesizedProgram;
pub use report::{
    AttemptStatus, Capabilities, EmergenceReport, OrchestratorMetrics, SolveRecord, StrategyAttempt,
};
pub use strategy::{default_strategies, Candidate, EnumerativeStrategy, GeneticStrategy, SynthesisStrategy};
