use serde::{Deserialize, Serialize};

/// Which budget ended a search that found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exhaustion {
    MaxSize,
    TimeBudget,
    CandidateLimit,
}

impl std::fmt::Display for Exhaustion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MaxSize => write!(f, "max size"),
            Self::TimeBudget => write!(f, "time budget"),
            Self::CandidateLimit => write!(f, "candidate limit"),
        }
    }
}

/// Counters for one enumeration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationStats {
    /// Size levels fully generated.
    pub levels_completed: usize,
    /// Candidates constructed, including terminals.
    pub candidates: usize,
    /// Candidates kept as equivalence-class representatives.
    pub retained: usize,
    /// Candidates dropped because an earlier one had the same outputs.
    pub pruned_equivalent: usize,
    /// Candidates dropped because they failed on some example.
    pub discarded_failures: usize,
    /// Set when the search ended without a match.
    pub exhausted_by: Option<Exhaustion>,
}

impl EnumerationStats {
    /// Fraction of constructed candidates removed by equivalence pruning.
    pub fn pruning_ratio(&self) -> f64 {
        if self.candidates == 0 {
            return 0.0;
        }
        self.pruned_equivalent as f64 / self.candidates as f64
    }
}
