#![deny(unsafe_code)]
//! # maple-synth-meta-learner
//!
//! Chooses the order in which synthesis strategies are attempted. Problems
//! are reduced to a [`FeatureBucket`] (arity, result type, example count
//! band, value magnitude band) and each `(strategy, bucket)` pair keeps a
//! [`StrategyRecord`] that is updated after every attempt.

pub mod features;
pub mod learner;

pub use features::{ExampleBand, FeatureBucket, MagnitudeBand, ProblemFeatures};
pub use learner::{
    AttemptOutcome, LearningInsights, MetaLearner, StrategyId, StrategyRecord, StrategySummary,
    DEFAULT_HISTORY_LIMIT,
};
