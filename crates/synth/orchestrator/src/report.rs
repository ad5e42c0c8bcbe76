//! Run records, counters and the capability-emergence report.

use std::fmt;

use chrono::{DateTime, Utc};
use maple_synth_meta_learner::StrategyId;
use serde::{Deserialize, Serialize};

// ── Solve Records ───────────────────────────────────────────────────

/// What happened when one strategy was tried.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttemptStatus {
    /// Budget ran out without a candidate.
    NoCandidate,
    /// A candidate was found but failed a mandatory check.
    Rejected { verdict: String },
    /// A candidate was kept only because best-effort results are allowed.
    BestEffort { verdict: String },
    Accepted { verdict: String },
    /// The strategy reported an error; the next strategy is tried.
    Errored { message: String },
}

impl AttemptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// One strategy attempt within a solve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: StrategyId,
    pub latency_ms: f64,
    pub status: AttemptStatus,
}

impl fmt::Display for StrategyAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match &self.status {
            AttemptStatus::NoCandidate => "no candidate".to_string(),
            AttemptStatus::Rejected { verdict } => format!("rejected ({})", verdict),
            AttemptStatus::BestEffort { verdict } => format!("best effort ({})", verdict),
            AttemptStatus::Accepted { verdict } => format!("accepted ({})", verdict),
            AttemptStatus::Errored { message } => format!("error: {}", message),
        };
        write!(f, "{} {:.1}ms {}", self.strategy, self.latency_ms, status)
    }
}

/// Complete record of one `solve_problem` call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveRecord {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Feature bucket the problem fell into.
    pub bucket: String,
    pub attempts: Vec<StrategyAttempt>,
    /// Rendering of the returned program, if any.
    pub program: Option<String>,
    /// Strategy whose candidate was returned.
    pub strategy: Option<StrategyId>,
    pub verified: bool,
}

impl SolveRecord {
    pub fn solved(&self) -> bool {
        self.program.is_some()
    }

    pub fn total_latency_ms(&self) -> f64 {
        self.attempts.iter().map(|a| a.latency_ms).sum()
    }
}

// ── Metrics ─────────────────────────────────────────────────────────

/// Counters over the orchestrator's lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorMetrics {
    pub problems_attempted: u64,
    pub problems_solved: u64,
    pub verified_solutions: u64,
    pub strategy_attempts: u64,
    pub capabilities_admitted: u64,
    pub duplicate_capabilities: u64,
}

impl OrchestratorMetrics {
    pub fn solve_rate(&self) -> f64 {
        if self.problems_attempted == 0 {
            0.0
        } else {
            self.problems_solved as f64 / self.problems_attempted as f64
        }
    }
}

// ── Capabilities ────────────────────────────────────────────────────

/// Primitive names split by origin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub initial: Vec<String>,
    pub learned: Vec<String>,
}

impl Capabilities {
    pub fn total(&self) -> usize {
        self.initial.len() + self.learned.len()
    }
}

// ── Emergence Report ────────────────────────────────────────────────

/// Outcome of a curriculum run against a problem the initial table
/// cannot solve.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmergenceReport {
    /// Description of the target problem.
    pub target: String,
    pub solvable_before: bool,
    pub solvable_after: bool,
    pub solution_before: Option<String>,
    pub solution_after: Option<String>,
    /// Renderings of the curriculum solutions, in curriculum order.
    pub curriculum: Vec<String>,
    pub capabilities_admitted: usize,
    pub registry_size_before: usize,
    pub registry_size_after: usize,
    /// `registry_size_after / registry_size_before`.
    pub expansion_ratio: f64,
    pub generated_at: DateTime<Utc>,
}

impl EmergenceReport {
    /// True when the target went from unsolvable to solvable.
    pub fn emerged(&self) -> bool {
        !self.solvable_before && self.solvable_after
    }
}

impl fmt::Display for EmergenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "target: {}", self.target)?;
        writeln!(
            f,
            "before: {}",
            self.solution_before.as_deref().unwrap_or("no solution")
        )?;
        for (i, step) in self.curriculum.iter().enumerate() {
            writeln!(f, "curriculum {}: {}", i + 1, step)?;
        }
        writeln!(
            f,
            "after: {}",
            self.solution_after.as_deref().unwrap_or("no solution")
        )?;
        write!(
            f,
            "registry: {} -> {} primitives (expansion {:.3}, {} admitted)",
            self.registry_size_before,
            self.registry_size_after,
            self.expansion_ratio,
            self.capabilities_admitted
        )
    }
}
