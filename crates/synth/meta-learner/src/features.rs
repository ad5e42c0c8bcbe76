//! Problem features and the coarse buckets strategy records are keyed by.

use std::fmt;

use maple_synth_types::{IOExample, ProblemSignature, SynthResult, Type};
use serde::{Deserialize, Serialize};

/// Observable shape of a synthesis problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemFeatures {
    pub inputs: Vec<Type>,
    pub output: Type,
    pub example_count: usize,
    /// Largest absolute integer appearing in any input or output.
    pub max_magnitude: u64,
}

impl ProblemFeatures {
    pub fn extract(examples: &[IOExample]) -> SynthResult<Self> {
        let signature = ProblemSignature::infer(examples)?;
        let max_magnitude = examples
            .iter()
            .flat_map(|ex| ex.inputs.iter().chain(std::iter::once(&ex.output)))
            .flat_map(|v| v.integers())
            .map(i64::unsigned_abs)
            .max()
            .unwrap_or(0);
        Ok(Self {
            inputs: signature.inputs,
            output: signature.output,
            example_count: examples.len(),
            max_magnitude,
        })
    }

    pub fn arity(&self) -> usize {
        self.inputs.len()
    }

    pub fn bucket(&self) -> FeatureBucket {
        FeatureBucket {
            arity: self.arity(),
            output: self.output.clone(),
            examples: ExampleBand::of(self.example_count),
            magnitude: MagnitudeBand::of(self.max_magnitude),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExampleBand {
    /// Up to 3 examples.
    Few,
    /// Up to 8 examples.
    Some,
    Many,
}

impl ExampleBand {
    fn of(count: usize) -> Self {
        match count {
            0..=3 => Self::Few,
            4..=8 => Self::Some,
            _ => Self::Many,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MagnitudeBand {
    /// |v| <= 10
    Small,
    /// |v| <= 1000
    Medium,
    Large,
}

impl MagnitudeBand {
    fn of(magnitude: u64) -> Self {
        match magnitude {
            0..=10 => Self::Small,
            11..=1000 => Self::Medium,
            _ => Self::Large,
        }
    }
}

/// Coarse problem class. Problems in one bucket share strategy statistics.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureBucket {
    pub arity: usize,
    pub output: Type,
    pub examples: ExampleBand,
    pub magnitude: MagnitudeBand,
}

impl fmt::Display for FeatureBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let examples = match self.examples {
            ExampleBand::Few => "few",
            ExampleBand::Some => "some",
            ExampleBand::Many => "many",
        };
        let magnitude = match self.magnitude {
            MagnitudeBand::Small => "small",
            MagnitudeBand::Medium => "medium",
            MagnitudeBand::Large => "large",
        };
        write!(f, "{}->{}/{}/{}", self.arity, self.output, examples, magnitude)
    }
}
