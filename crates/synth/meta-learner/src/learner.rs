//! Strategy ranking and outcome tracking.

use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use maple_synth_types::{SynthError, SynthResult, SynthesisConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::{FeatureBucket, ProblemFeatures};

// ── Identifiers and records ─────────────────────────────────────────

/// Name of a registered synthesis strategy, e.g. `"enumerative"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrategyId(pub String);

impl StrategyId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StrategyId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome counts of one strategy on one feature bucket. Never deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyRecord {
    pub strategy: StrategyId,
    pub bucket: FeatureBucket,
    pub successes: u64,
    pub failures: u64,
    /// Running mean of attempt latency in milliseconds.
    pub mean_latency_ms: f64,
}

impl StrategyRecord {
    fn new(strategy: StrategyId, bucket: FeatureBucket) -> Self {
        Self {
            strategy,
            bucket,
            successes: 0,
            failures: 0,
            mean_latency_ms: 0.0,
        }
    }

    pub fn attempts(&self) -> u64 {
        self.successes + self.failures
    }

    /// Raw empirical success rate, 0.0 when never attempted.
    pub fn success_rate(&self) -> f64 {
        match self.attempts() {
            0 => 0.0,
            n => self.successes as f64 / n as f64,
        }
    }

    /// Laplace-smoothed success rate; an untried strategy scores 0.5.
    fn score(&self) -> f64 {
        (self.successes as f64 + 1.0) / (self.attempts() as f64 + 2.0)
    }

    fn observe(&mut self, success: bool, latency_ms: f64) {
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        let n = self.attempts() as f64;
        self.mean_latency_ms += (latency_ms - self.mean_latency_ms) / n;
    }
}

/// One reported attempt, in arrival order. Only the most recent
/// `history_limit` outcomes are kept; aggregate counts live in the records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub timestamp: DateTime<Utc>,
    pub strategy: StrategyId,
    pub bucket: FeatureBucket,
    pub success: bool,
    pub latency_ms: f64,
}

// ── Insights ────────────────────────────────────────────────────────

/// Aggregate statistics for one strategy across all buckets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub strategy: StrategyId,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub mean_latency_ms: f64,
}

/// What the learner has learned so far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearningInsights {
    pub strategy_count: usize,
    pub total_attempts: usize,
    pub successful_attempts: usize,
    pub success_rate: f64,
    pub strategies: Vec<StrategySummary>,
    /// Currently preferred strategy per bucket that has any record.
    pub preferred: BTreeMap<String, StrategyId>,
}

// ── Learner ─────────────────────────────────────────────────────────

/// Default number of attempt outcomes kept in the history.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

/// Ranks a closed set of strategies per problem bucket.
///
/// Ranking is by smoothed empirical success rate, then lower mean latency,
/// then registration order. With probability `exploration_rate` the
/// least-tried strategy for the bucket is promoted to the front. All
/// randomness comes from one seeded generator, so a fixed seed and a fixed
/// sequence of calls always produce the same orders.
pub struct MetaLearner {
    strategies: Vec<StrategyId>,
    records: BTreeMap<(usize, FeatureBucket), StrategyRecord>,
    /// Bounded FIFO of recent outcomes.
    history: VecDeque<AttemptOutcome>,
    history_limit: usize,
    exploration_rate: f64,
    rng: StdRng,
}

impl MetaLearner {
    pub fn new(exploration_rate: f64, seed: u64) -> Self {
        Self {
            strategies: Vec::new(),
            records: BTreeMap::new(),
            history: VecDeque::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            exploration_rate: exploration_rate.clamp(0.0, 1.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &SynthesisConfig) -> Self {
        Self::new(config.exploration_rate, config.seed).with_history_limit(config.max_tracked_records)
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    /// Register a strategy. Registration order is the final tie-break.
    /// Returns false if the name is already registered.
    pub fn register_strategy(&mut self, id: impl Into<StrategyId>) -> bool {
        let id = id.into();
        if self.strategies.contains(&id) {
            return false;
        }
        self.strategies.push(id);
        true
    }

    pub fn strategies(&self) -> &[StrategyId] {
        &self.strategies
    }

    /// Order in which strategies should be attempted on a problem.
    pub fn rank(&mut self, features: &ProblemFeatures) -> Vec<StrategyId> {
        let bucket = features.bucket();
        let mut order = self.ordered(&bucket);

        if order.len() > 1 && self.rng.gen::<f64>() < self.exploration_rate {
            let least_tried = order
                .iter()
                .enumerate()
                .min_by_key(|&(_, idx)| (self.attempts(*idx, &bucket), *idx))
                .map(|(pos, _)| pos);
            if let Some(pos) = least_tried.filter(|&pos| pos > 0) {
                let idx = order.remove(pos);
                order.insert(0, idx);
                debug!(
                    bucket = %bucket,
                    strategy = %self.strategies[idx],
                    "Exploring under-tried strategy"
                );
            }
        }

        order.into_iter().map(|idx| self.strategies[idx].clone()).collect()
    }

    /// Report the outcome of one attempt.
    pub fn record(
        &mut self,
        strategy: &StrategyId,
        features: &ProblemFeatures,
        success: bool,
        latency: Duration,
    ) -> SynthResult<()> {
        let idx = self
            .strategies
            .iter()
            .position(|s| s == strategy)
            .ok_or_else(|| SynthError::InvalidConfiguration(format!("unknown strategy {}", strategy)))?;
        let bucket = features.bucket();
        let latency_ms = latency.as_secs_f64() * 1000.0;

        self.records
            .entry((idx, bucket.clone()))
            .or_insert_with(|| StrategyRecord::new(strategy.clone(), bucket.clone()))
            .observe(success, latency_ms);
        if self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(AttemptOutcome {
            timestamp: Utc::now(),
            strategy: strategy.clone(),
            bucket: bucket.clone(),
            success,
            latency_ms,
        });
        debug!(strategy = %strategy, bucket = %bucket, success, latency_ms, "Strategy outcome recorded");
        Ok(())
    }

    pub fn record_for(&self, strategy: &StrategyId, bucket: &FeatureBucket) -> Option<&StrategyRecord> {
        let idx = self.strategies.iter().position(|s| s == strategy)?;
        self.records.get(&(idx, bucket.clone()))
    }

    pub fn records(&self) -> impl Iterator<Item = &StrategyRecord> {
        self.records.values()
    }

    /// Most recent outcomes, oldest first.
    pub fn history(&self) -> &VecDeque<AttemptOutcome> {
        &self.history
    }

    pub fn insights(&self) -> LearningInsights {
        let total_attempts = self.records.values().map(|r| r.attempts() as usize).sum::<usize>();
        let successful_attempts = self.records.values().map(|r| r.successes as usize).sum::<usize>();

        let strategies = self
            .strategies
            .iter()
            .enumerate()
            .map(|(idx, id)| {
                let (mut successes, mut failures, mut latency_total) = (0u64, 0u64, 0.0);
                for record in self.records.iter().filter(|((i, _), _)| *i == idx).map(|(_, r)| r) {
                    successes += record.successes;
                    failures += record.failures;
                    latency_total += record.mean_latency_ms * record.attempts() as f64;
                }
                let attempts = successes + failures;
                StrategySummary {
                    strategy: id.clone(),
                    successes,
                    failures,
                    success_rate: if attempts == 0 { 0.0 } else { successes as f64 / attempts as f64 },
                    mean_latency_ms: if attempts == 0 { 0.0 } else { latency_total / attempts as f64 },
                }
            })
            .collect();

        let mut preferred = BTreeMap::new();
        for (_, bucket) in self.records.keys() {
            if preferred.contains_key(&bucket.to_string()) {
                continue;
            }
            if let Some(&idx) = self.ordered(bucket).first() {
                preferred.insert(bucket.to_string(), self.strategies[idx].clone());
            }
        }

        LearningInsights {
            strategy_count: self.strategies.len(),
            total_attempts,
            successful_attempts,
            success_rate: if total_attempts == 0 {
                0.0
            } else {
                successful_attempts as f64 / total_attempts as f64
            },
            strategies,
            preferred,
        }
    }

    // ── Internals ──

    fn attempts(&self, idx: usize, bucket: &FeatureBucket) -> u64 {
        self.records
            .get(&(idx, bucket.clone()))
            .map(StrategyRecord::attempts)
            .unwrap_or(0)
    }

    /// Deterministic ranking without exploration.
    fn ordered(&self, bucket: &FeatureBucket) -> Vec<usize> {
        let mut keyed: Vec<(usize, f64, f64)> = (0..self.strategies.len())
            .map(|idx| match self.records.get(&(idx, bucket.clone())) {
                Some(r) => (idx, r.score(), r.mean_latency_ms),
                None => (idx, 0.5, f64::INFINITY),
            })
            .collect();
        keyed.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
                .then(a.0.cmp(&b.0))
        });
        keyed.into_iter().map(|(idx, _, _)| idx).collect()
    }
}

impl fmt::Display for MetaLearner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let solved: u64 = self.records.values().map(|r| r.successes).sum();
        let attempts: u64 = self.records.values().map(StrategyRecord::attempts).sum();
        write!(
            f,
            "MetaLearner(strategies={}, solved={}/{})",
            self.strategies.len(),
            solved,
            attempts
        )
    }
}
