//! The synthesis driver.
//!
//! One request flows `features → strategy order → search → verify →
//! record`. The capability registry and the meta-learner are the only
//! state shared across requests; each request works against a frozen
//! registry snapshot.

use std::collections::VecDeque;
use std::time::Instant;

use chrono::Utc;
use maple_synth_meta_learner::{LearningInsights, MetaLearner, ProblemFeatures};
use maple_synth_registry::{CapabilityRegistry, RegistrationOutcome, RegistrySnapshot};
use maple_synth_types::{
    Constraints, IOExample, PrimitiveTable, ProblemSignature, SynthError, SynthResult,
    SynthesisConfig,
};
use maple_synth_verifier::{VerificationResult, Verifier};
use tracing::{debug, info, warn};

use crate::program::SynthesizedProgram;
use crate::report::{
    AttemptStatus, Capabilities, EmergenceReport, OrchestratorMetrics, SolveRecord, StrategyAttempt,
};
use crate::strategy::{default_strategies, SynthesisStrategy};

/// Exponent of the emergence target; out of reach of the seed table at
/// the default size and depth budgets.
const EMERGENCE_EXPONENT: u32 = 16;
const EMERGENCE_CURRICULUM: [u32; 2] = [2, 4];

/// Cost weight of every admitted capability.
const CAPABILITY_COST: u32 = 1;

/// `f(x) = x^exponent` on `x = 0..=5`.
fn power_examples(exponent: u32) -> Vec<IOExample> {
    (0..=5i64).map(|x| IOExample::ints(&[x], x.pow(exponent))).collect()
}

/// Drives synthesis requests end to end and grows the capability registry.
pub struct Orchestrator {
    config: SynthesisConfig,
    registry: CapabilityRegistry,
    learner: MetaLearner,
    strategies: Vec<Box<dyn SynthesisStrategy>>,
    /// Bounded FIFO of recent solve records.
    history: VecDeque<SolveRecord>,
    metrics: OrchestratorMetrics,
}

impl Orchestrator {
    /// Orchestrator over the full builtin table with the default strategies.
    pub fn new(config: SynthesisConfig) -> SynthResult<Self> {
        let registry = CapabilityRegistry::with_builtins()
            .with_probe_limit(config.probe_limit)
            .with_eval_limits(config.eval_limits());
        Self::with_registry(registry, config)
    }

    /// Orchestrator over a caller-built registry.
    pub fn with_registry(registry: CapabilityRegistry, config: SynthesisConfig) -> SynthResult<Self> {
        config.validate()?;
        if registry.is_empty() {
            return Err(SynthError::InvalidConfiguration("primitive table is empty".into()));
        }
        let mut orchestrator = Self {
            learner: MetaLearner::from_config(&config),
            config,
            registry,
            strategies: Vec::new(),
            history: VecDeque::new(),
            metrics: OrchestratorMetrics::default(),
        };
        for strategy in default_strategies() {
            orchestrator.register_strategy(strategy);
        }
        Ok(orchestrator)
    }

    /// Add a strategy. Returns false if one with the same name exists.
    pub fn register_strategy(&mut self, strategy: Box<dyn SynthesisStrategy>) -> bool {
        if !self.learner.register_strategy(strategy.name()) {
            return false;
        }
        self.strategies.push(strategy);
        true
    }

    // ── Requests ──

    /// Solve one problem with the configured budgets.
    ///
    /// Strategies run in the order the meta-learner proposes until one
    /// yields an acceptable program. With `verify` a program is acceptable
    /// when replay and type checks pass; without it, when the strategy
    /// matched every example. Returns `Ok(None)` when every strategy is
    /// exhausted.
    pub fn solve_problem(
        &mut self,
        examples: &[IOExample],
        verify: bool,
    ) -> SynthResult<Option<SynthesizedProgram>> {
        let config = self.config.clone();
        let snapshot = self.registry.snapshot();
        self.run(examples, &config, verify, snapshot)
    }

    /// Verified synthesis with optional per-call constraint overrides.
    pub fn synthesize(
        &mut self,
        examples: &[IOExample],
        constraints: Option<&Constraints>,
    ) -> SynthResult<Option<SynthesizedProgram>> {
        let config = match constraints {
            Some(c) => self.config.constrained(c),
            None => self.config.clone(),
        };
        let snapshot = self.registry.snapshot();
        self.run(examples, &config, true, snapshot)
    }

    /// Re-verify a program against a signature and examples.
    pub fn verify(
        &self,
        program: &SynthesizedProgram,
        signature: &ProblemSignature,
        examples: &[IOExample],
    ) -> VerificationResult {
        Verifier::new(program.table(), &self.config).verify(&program.expression, signature, examples)
    }

    /// Promote a verified program to a new primitive named `learned_<n>`.
    ///
    /// Returns `Ok(false)` when an existing primitive with the same
    /// signature is indistinguishable from it on the probe set. Programs
    /// that were never verified, or did not pass every check, are refused
    /// with [`SynthError::VerificationFailed`] or
    /// [`SynthError::NonTerminationSuspected`].
    pub fn register_capability(&mut self, program: &SynthesizedProgram) -> SynthResult<bool> {
        self.check_lineage(program)?;
        let verified = match &program.verification {
            Some(verification) => verification.require_verified(),
            None => Err(SynthError::VerificationFailed(format!(
                "{} was never verified",
                program.rendering
            ))),
        };
        if let Err(e) = verified {
            warn!(body = %program.rendering, error = %e, "Capability refused");
            return Err(e);
        }
        let name = self.next_capability_name();
        let outcome = self.registry.register(
            name.clone(),
            program.signature.as_primitive_signature(),
            program.expression.clone(),
            CAPABILITY_COST,
        )?;
        match outcome {
            RegistrationOutcome::Admitted(id) => {
                self.metrics.capabilities_admitted += 1;
                info!(name = %name, id = %id, body = %program.rendering, "Capability expanded");
                Ok(true)
            }
            RegistrationOutcome::Duplicate { existing } => {
                self.metrics.duplicate_capabilities += 1;
                debug!(body = %program.rendering, existing = %existing, "Capability already present");
                Ok(false)
            }
        }
    }

    /// Solve each problem set and admit every verified, novel solution.
    /// Returns the number of admitted capabilities.
    pub fn learn_and_expand(&mut self, problem_sets: &[Vec<IOExample>]) -> SynthResult<usize> {
        self.expand(problem_sets).map(|(admitted, _)| admitted)
    }

    /// Show a target out of reach of the seed table becoming solvable after
    /// a curriculum of stepping-stone problems.
    ///
    /// "Before" is always measured against the seed primitives alone, so
    /// capabilities learned by earlier requests do not mask the effect.
    pub fn demonstrate_emergence(&mut self) -> SynthResult<EmergenceReport> {
        let target = power_examples(EMERGENCE_EXPONENT);
        let curriculum: Vec<Vec<IOExample>> =
            EMERGENCE_CURRICULUM.iter().map(|&e| power_examples(e)).collect();

        let seed = self.registry.seed_snapshot();
        let registry_size_before = seed.len();
        let config = self.config.clone();
        let before = self.run(&target, &config, true, seed)?;
        let (capabilities_admitted, renderings) = self.expand(&curriculum)?;
        let after = self.solve_problem(&target, true)?;
        let registry_size_after = self.registry.len();

        let report = EmergenceReport {
            target: format!("f(x) = x^{} for x in 0..=5", EMERGENCE_EXPONENT),
            solvable_before: before.is_some(),
            solvable_after: after.is_some(),
            solution_before: before.map(|p| p.rendering),
            solution_after: after.map(|p| p.rendering),
            curriculum: renderings,
            capabilities_admitted,
            registry_size_before,
            registry_size_after,
            expansion_ratio: registry_size_after as f64 / registry_size_before as f64,
            generated_at: Utc::now(),
        };
        info!(
            emerged = report.emerged(),
            expansion_ratio = report.expansion_ratio,
            "Emergence demonstration finished"
        );
        Ok(report)
    }

    // ── Introspection ──

    pub fn capabilities(&self) -> Capabilities {
        let names = self.registry.names();
        let split = self.registry.builtin_count().min(names.len());
        Capabilities {
            initial: names[..split].to_vec(),
            learned: names[split..].to_vec(),
        }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn meta_learner(&self) -> &MetaLearner {
        &self.learner
    }

    pub fn insights(&self) -> LearningInsights {
        self.learner.insights()
    }

    pub fn metrics(&self) -> &OrchestratorMetrics {
        &self.metrics
    }

    /// Most recent solve records, oldest first.
    pub fn history(&self) -> &VecDeque<SolveRecord> {
        &self.history
    }

    // ── Internals ──

    fn run(
        &mut self,
        examples: &[IOExample],
        config: &SynthesisConfig,
        verify: bool,
        snapshot: RegistrySnapshot,
    ) -> SynthResult<Option<SynthesizedProgram>> {
        config.validate()?;
        let features = ProblemFeatures::extract(examples)?;
        let signature = ProblemSignature::infer(examples)?;
        let order = self.learner.rank(&features);
        let started_at = Utc::now();
        self.metrics.problems_attempted += 1;

        let mut attempts = Vec::with_capacity(order.len());
        let mut accepted: Option<SynthesizedProgram> = None;
        let mut fallback: Option<SynthesizedProgram> = None;

        for id in order {
            let Some(strategy) = self.strategies.iter().find(|s| s.name() == id.as_str()) else {
                continue;
            };
            let clock = Instant::now();
            let outcome = strategy.attempt(&snapshot, examples, config);
            self.metrics.strategy_attempts += 1;

            let status = match outcome {
                Err(SynthError::SynthesisExhausted(reason)) => {
                    debug!(strategy = %id, reason = %reason, "Strategy exhausted its budget");
                    AttemptStatus::NoCandidate
                }
                Err(e) => {
                    warn!(strategy = %id, error = %e, "Strategy failed");
                    AttemptStatus::Errored { message: e.to_string() }
                }
                Ok(candidate) => {
                    let verification = verify.then(|| {
                        Verifier::new(&snapshot, config).verify(&candidate.expression, &signature, examples)
                    });
                    let admissible = verification.as_ref().map_or(candidate.exact, |v| v.admissible);
                    let verdict = verification
                        .as_ref()
                        .map_or_else(|| "unchecked".to_string(), |v| v.verdict());
                    let program = SynthesizedProgram::new(
                        candidate.expression,
                        candidate.size,
                        signature.clone(),
                        id.clone(),
                        verification,
                        snapshot.clone(),
                        config.eval_limits(),
                    );
                    if admissible {
                        accepted = Some(program);
                        AttemptStatus::Accepted { verdict }
                    } else if config.best_effort {
                        fallback.get_or_insert(program);
                        AttemptStatus::BestEffort { verdict }
                    } else {
                        AttemptStatus::Rejected { verdict }
                    }
                }
            };
            let latency = clock.elapsed();

            self.learner.record(&id, &features, status.is_success(), latency)?;
            attempts.push(StrategyAttempt {
                strategy: id,
                latency_ms: latency.as_secs_f64() * 1000.0,
                status,
            });
            if accepted.is_some() {
                break;
            }
        }

        let result = accepted.or(fallback);
        match &result {
            Some(program) => {
                self.metrics.problems_solved += 1;
                if program.is_verified() {
                    self.metrics.verified_solutions += 1;
                }
                info!(
                    program = %program.rendering,
                    size = program.size,
                    strategy = %program.strategy,
                    verdict = %program.verification.as_ref().map(|v| v.verdict()).unwrap_or_default(),
                    "Problem solved"
                );
            }
            None => warn!(
                bucket = %features.bucket(),
                attempts = attempts.len(),
                "No strategy produced an acceptable program"
            ),
        }

        if self.history.len() >= self.config.max_tracked_records {
            self.history.pop_front();
        }
        self.history.push_back(SolveRecord {
            started_at,
            completed_at: Utc::now(),
            bucket: features.bucket().to_string(),
            attempts,
            program: result.as_ref().map(|p| p.rendering.clone()),
            strategy: result.as_ref().map(|p| p.strategy.clone()),
            verified: result.as_ref().is_some_and(|p| p.is_verified()),
        });
        Ok(result)
    }

    fn expand(&mut self, problem_sets: &[Vec<IOExample>]) -> SynthResult<(usize, Vec<String>)> {
        let mut admitted = 0;
        let mut renderings = Vec::with_capacity(problem_sets.len());
        for examples in problem_sets {
            match self.solve_problem(examples, true)? {
                Some(program) => {
                    if program.is_verified() && self.register_capability(&program)? {
                        admitted += 1;
                    }
                    renderings.push(program.rendering);
                }
                None => renderings.push("no solution".to_string()),
            }
        }
        Ok((admitted, renderings))
    }

    /// The program's table must be a prefix of the live registry, otherwise
    /// its primitive ids mean something else here.
    fn check_lineage(&self, program: &SynthesizedProgram) -> SynthResult<()> {
        let table = program.table();
        let consistent = table.len() <= self.registry.len()
            && table
                .primitives()
                .all(|p| self.registry.get(p.id).is_some_and(|q| q.name == p.name));
        if consistent {
            Ok(())
        } else {
            Err(SynthError::InvalidProblem(
                "program was synthesized against a different registry".into(),
            ))
        }
    }

    fn next_capability_name(&self) -> String {
        let mut n = self.registry.learned().count() + 1;
        loop {
            let name = format!("learned_{}", n);
            if self.registry.find(&name).is_none() {
                return name;
            }
            n += 1;
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let strategies: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("Orchestrator")
            .field("primitives", &self.registry.len())
            .field("strategies", &strategies)
            .field("metrics", &self.metrics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Candidate;
    use maple_synth_meta_learner::StrategyId;
    use maple_synth_types::{Builtin, Expression, Value};
    use std::time::Duration;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(SynthesisConfig::default().with_exploration_rate(0.0)).unwrap()
    }

    fn successor() -> Vec<IOExample> {
        (0..3).map(|x| IOExample::ints(&[x], x + 1)).collect()
    }

    /// Proposes a fixed wrong program.
    struct Stubborn;

    impl SynthesisStrategy for Stubborn {
        fn name(&self) -> &str {
            "stubborn"
        }

        fn attempt(
            &self,
            table: &dyn PrimitiveTable,
            _examples: &[IOExample],
            _config: &SynthesisConfig,
        ) -> SynthResult<Candidate> {
            let neg = table.find("neg").map(|p| p.id).ok_or_else(|| {
                SynthError::InvalidConfiguration("neg missing".into())
            })?;
            Ok(Candidate {
                expression: Expression::apply(neg, vec![Expression::var(0)]),
                size: 2,
                exact: false,
            })
        }
    }

    #[test]
    fn solves_and_records() {
        let mut orch = orchestrator();
        let program = orch.solve_problem(&successor(), true).unwrap().unwrap();
        assert_eq!(program.rendering, "add(x0, 1)");
        assert!(program.is_verified());
        assert_eq!(program.strategy, StrategyId::from("enumerative"));
        assert_eq!(program.call(&[Value::Int(100)]), Ok(Value::Int(101)));

        assert_eq!(orch.metrics().problems_attempted, 1);
        assert_eq!(orch.metrics().problems_solved, 1);
        assert_eq!(orch.metrics().verified_solutions, 1);
        let record = &orch.history()[0];
        assert!(record.solved());
        assert_eq!(record.attempts.len(), 1);
        assert_eq!(orch.insights().total_attempts, 1);
    }

    #[test]
    fn skipping_verification_leaves_result_unchecked() {
        let mut orch = orchestrator();
        let program = orch.solve_problem(&successor(), false).unwrap().unwrap();
        assert!(program.verification.is_none());
        assert!(!program.is_verified());
        assert!(program.to_string().ends_with("unchecked]"));
    }

    #[test]
    fn rejected_candidate_falls_through_to_next_strategy() {
        let registry = CapabilityRegistry::with_builtins();
        let mut orch = Orchestrator::with_registry(registry, SynthesisConfig::default().with_exploration_rate(0.0))
            .unwrap();
        assert!(orch.register_strategy(Box::new(Stubborn)));
        assert!(!orch.register_strategy(Box::new(Stubborn)));

        let examples = successor();
        let features = ProblemFeatures::extract(&examples).unwrap();
        // Demote the builtin strategies so the untried stub goes first.
        for name in ["enumerative", "genetic"] {
            orch.learner
                .record(&name.into(), &features, false, Duration::ZERO)
                .unwrap();
        }
        let program = orch.solve_problem(&examples, true).unwrap().unwrap();
        assert_eq!(program.rendering, "add(x0, 1)");

        let attempts = &orch.history()[0].attempts;
        assert_eq!(attempts[0].strategy, StrategyId::from("stubborn"));
        assert!(matches!(attempts[0].status, AttemptStatus::Rejected { .. }));
        assert!(attempts[1].status.is_success());
    }

    #[test]
    fn best_effort_returns_inadmissible_candidate() {
        let registry = CapabilityRegistry::from_builtins(&[Builtin::Neg]);
        let config = SynthesisConfig::default()
            .with_exploration_rate(0.0)
            .with_population(8, 2)
            .with_best_effort(true);
        let mut orch = Orchestrator::with_registry(registry, config).unwrap();
        let program = orch.solve_problem(&successor(), true).unwrap().unwrap();
        assert!(!program.verification.as_ref().unwrap().admissible);
        assert!(orch.history()[0].solved());
        assert!(!orch.history()[0].verified);
    }

    #[test]
    fn inadmissible_program_is_not_promoted() {
        let registry = CapabilityRegistry::from_builtins(&[Builtin::Mul]);
        let config = SynthesisConfig::default()
            .with_exploration_rate(0.0)
            .with_population(8, 2)
            .with_best_effort(true);
        let mut orch = Orchestrator::with_registry(registry, config).unwrap();
        let program = orch.solve_problem(&successor(), true).unwrap().unwrap();
        assert!(!program.is_verified());

        let err = orch.register_capability(&program).unwrap_err();
        assert!(matches!(err, SynthError::VerificationFailed(ref m) if m.contains("rejected")));
        assert!(orch.capabilities().learned.is_empty());
        assert_eq!(orch.metrics().capabilities_admitted, 0);
    }

    #[test]
    fn unchecked_program_is_not_promoted() {
        let mut orch = orchestrator();
        let program = orch.solve_problem(&successor(), false).unwrap().unwrap();
        let err = orch.register_capability(&program).unwrap_err();
        assert!(matches!(err, SynthError::VerificationFailed(ref m) if m.contains("never verified")));
        assert_eq!(orch.registry().len(), Builtin::all().len());
    }

    #[test]
    fn solve_history_is_bounded() {
        let config = SynthesisConfig::default()
            .with_exploration_rate(0.0)
            .with_max_tracked_records(2);
        let mut orch = Orchestrator::new(config).unwrap();
        for offset in 1..=3 {
            let examples: Vec<IOExample> = (0..3).map(|x| IOExample::ints(&[x], x + offset)).collect();
            orch.solve_problem(&examples, true).unwrap().unwrap();
        }
        assert_eq!(orch.history().len(), 2);
        assert_eq!(orch.history()[0].program.as_deref(), Some("add(x0, 2)"));
        assert_eq!(orch.metrics().problems_attempted, 3);
        assert_eq!(orch.insights().total_attempts, 3);
    }

    #[test]
    fn exhausted_search_returns_none() {
        let registry = CapabilityRegistry::from_builtins(&[Builtin::Neg]);
        let config = SynthesisConfig::default().with_exploration_rate(0.0).with_population(8, 2);
        let mut orch = Orchestrator::with_registry(registry, config).unwrap();
        assert!(orch.solve_problem(&successor(), true).unwrap().is_none());
        assert_eq!(orch.metrics().problems_solved, 0);
        assert_eq!(orch.history()[0].attempts.len(), 2);
    }

    #[test]
    fn invalid_requests_are_errors() {
        let mut orch = orchestrator();
        let err = orch.solve_problem(&[], true).unwrap_err();
        assert!(err.is_fatal());

        let bad = Constraints::new().with_max_size(0);
        let err = orch.synthesize(&successor(), Some(&bad)).unwrap_err();
        assert!(matches!(err, SynthError::InvalidConfiguration(_)));

        let err = Orchestrator::with_registry(CapabilityRegistry::empty(), SynthesisConfig::default()).unwrap_err();
        assert!(matches!(err, SynthError::InvalidConfiguration(ref m) if m.contains("empty")));
    }

    #[test]
    fn constraints_limit_the_search() {
        let mut orch = orchestrator();
        // x*y + 1 needs size 5.
        let examples = vec![
            IOExample::ints(&[2, 3], 7),
            IOExample::ints(&[4, 5], 21),
            IOExample::ints(&[0, 9], 1),
        ];
        let tight = Constraints::new().with_max_size(3).with_max_depth(1);
        assert!(orch.synthesize(&examples, Some(&tight)).unwrap().is_none());
        let program = orch.synthesize(&examples, None).unwrap().unwrap();
        assert_eq!(program.size, 5);
    }

    #[test]
    fn capability_registration_dedups() {
        let mut orch = orchestrator();
        let double: Vec<IOExample> = (0..4).map(|x| IOExample::ints(&[x], 2 * x)).collect();
        let program = orch.solve_problem(&double, true).unwrap().unwrap();
        assert!(orch.register_capability(&program).unwrap());
        assert!(!orch.register_capability(&program).unwrap());
        assert_eq!(orch.capabilities().learned, vec!["learned_1".to_string()]);
        assert_eq!(orch.metrics().capabilities_admitted, 1);
        assert_eq!(orch.metrics().duplicate_capabilities, 1);

        let reverify = orch.verify(&program, &program.signature, &double);
        assert!(reverify.verified);
    }

    #[test]
    fn foreign_program_is_rejected() {
        let mut ours = orchestrator();
        let registry = CapabilityRegistry::from_builtins(&[Builtin::Mul, Builtin::Add]);
        let mut theirs = Orchestrator::with_registry(registry, SynthesisConfig::default()).unwrap();
        let examples: Vec<IOExample> = (0..4).map(|x| IOExample::ints(&[x], x * x)).collect();
        let program = theirs.solve_problem(&examples, true).unwrap().unwrap();
        assert!(ours.register_capability(&program).is_err());
    }

    #[test]
    fn learn_and_expand_counts_admissions() {
        let mut orch = orchestrator();
        let square: Vec<IOExample> = (0..5).map(|x| IOExample::ints(&[x], x * x)).collect();
        let admitted = orch.learn_and_expand(&[square.clone(), square]).unwrap();
        assert_eq!(admitted, 1);
        assert_eq!(orch.registry().len(), Builtin::all().len() + 1);
    }

    #[test]
    fn learned_capability_is_reused() {
        let mut orch = orchestrator();
        let square: Vec<IOExample> = (0..5).map(|x| IOExample::ints(&[x], x * x)).collect();
        orch.learn_and_expand(&[square]).unwrap();
        let fourth: Vec<IOExample> = (0..5).map(|x| IOExample::ints(&[x], x.pow(4))).collect();
        let program = orch.solve_problem(&fourth, true).unwrap().unwrap();
        assert_eq!(program.rendering, "learned_1(learned_1(x0))");
    }

    #[test]
    fn emergence_measured_against_seed_table() {
        let mut orch = orchestrator();
        let square: Vec<IOExample> = (0..=5).map(|x| IOExample::ints(&[x], x * x)).collect();
        let fourth: Vec<IOExample> = (0..=5).map(|x| IOExample::ints(&[x], x.pow(4))).collect();
        assert_eq!(orch.learn_and_expand(&[square, fourth]).unwrap(), 2);

        let report = orch.demonstrate_emergence().unwrap();
        assert!(!report.solvable_before);
        assert!(report.solvable_after);
        assert!(report.emerged());
        assert_eq!(report.capabilities_admitted, 0);
        assert_eq!(report.registry_size_before, Builtin::all().len());
        assert_eq!(report.registry_size_after, Builtin::all().len() + 2);
        assert!(report.expansion_ratio > 1.0);
    }
}
