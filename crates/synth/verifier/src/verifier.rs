use std::collections::{HashMap, HashSet};

use maple_synth_types::{
    probe_inputs, Builtin, EvalLimits, Evaluator, Expression, IOExample, Path, PrimitiveId,
    PrimitiveRule, PrimitiveTable, ProblemSignature, SynthesisConfig, Value,
};
use tracing::{debug, warn};

use crate::paths::{conditional_sites, eval_forced};
use crate::result::{
    Check, CheckOutcome, CheckRecord, Counterexample, VerificationMethod, VerificationResult,
};

/// Confidence multiplier when some explored branch has no supporting example.
const UNTESTED_BRANCH_FACTOR: f64 = 0.75;
/// Confidence multiplier when a fixpoint exceeded its iteration cap.
const NON_TERMINATION_FACTOR: f64 = 0.5;

/// Runs the ordered verification checks over one primitive table.
///
/// Verification is bounded: it replays the examples, checks types
/// statically, explores at most `path_exploration_budget` branch
/// assignments and caps every fixpoint. It never proves correctness
/// beyond those bounds.
pub struct Verifier<'t> {
    table: &'t dyn PrimitiveTable,
    limits: EvalLimits,
    path_budget: usize,
    probe_limit: usize,
}

impl<'t> Verifier<'t> {
    pub fn new(table: &'t dyn PrimitiveTable, config: &SynthesisConfig) -> Self {
        Self {
            table,
            limits: config.eval_limits(),
            path_budget: config.path_exploration_budget.max(1),
            probe_limit: config.probe_limit.max(1),
        }
    }

    pub fn verify(
        &self,
        expr: &Expression,
        signature: &ProblemSignature,
        examples: &[IOExample],
    ) -> VerificationResult {
        let evaluator = Evaluator::new(self.table, self.limits);
        let mut checks = Vec::with_capacity(4);
        let mut notes = Vec::new();

        let (replay, counterexample) = self.replay(&evaluator, expr, examples);
        checks.push(replay);
        checks.push(self.type_consistency(expr, signature));

        let admissible = checks.iter().all(|r| r.outcome == CheckOutcome::Passed);
        let method = if admissible {
            checks.push(self.explore_paths(&evaluator, expr, signature, examples, &mut notes));
            checks.push(self.termination(&evaluator, expr, signature, examples, &mut notes));
            VerificationMethod::Bounded
        } else {
            for check in [Check::PathExploration, Check::TerminationBound] {
                checks.push(CheckRecord {
                    check,
                    outcome: CheckOutcome::Skipped,
                    detail: "mandatory check failed".into(),
                });
            }
            VerificationMethod::Replay
        };

        let verified = checks.iter().all(|r| r.outcome == CheckOutcome::Passed);
        let confidence = if !admissible {
            0.0
        } else {
            checks.iter().fold(1.0, |c, r| match (r.check, r.outcome) {
                (Check::PathExploration, CheckOutcome::Downgraded) => c * UNTESTED_BRANCH_FACTOR,
                (Check::TerminationBound, CheckOutcome::Downgraded) => c * NON_TERMINATION_FACTOR,
                _ => c,
            })
        };

        let result = VerificationResult {
            verified,
            admissible,
            method,
            confidence,
            counterexample,
            notes,
            checks,
        };
        if admissible && !verified {
            warn!(
                program = %expr.render(self.table),
                verdict = %result.verdict(),
                "Verification downgraded"
            );
        } else {
            debug!(program = %expr.render(self.table), verdict = %result.verdict(), "Verification finished");
        }
        result
    }

    /// Whether `a` and `b` agree on every input tuple, counting matching
    /// failures as agreement.
    pub fn equivalent_on(&self, a: &Expression, b: &Expression, inputs: &[Vec<Value>]) -> bool {
        let evaluator = Evaluator::new(self.table, self.limits);
        inputs
            .iter()
            .all(|args| evaluator.eval(a, args).ok() == evaluator.eval(b, args).ok())
    }

    // ── Check 1 ──

    fn replay(
        &self,
        evaluator: &Evaluator<'_>,
        expr: &Expression,
        examples: &[IOExample],
    ) -> (CheckRecord, Option<Counterexample>) {
        for ex in examples {
            let actual = evaluator.eval(expr, &ex.inputs);
            if actual.as_ref().ok() != Some(&ex.output) {
                let cx = Counterexample {
                    inputs: ex.inputs.clone(),
                    expected: ex.output.clone(),
                    actual: actual.map_err(|e| e.to_string()),
                };
                let record = CheckRecord {
                    check: Check::ExampleReplay,
                    outcome: CheckOutcome::Failed,
                    detail: format!("mismatch on {}", cx),
                };
                return (record, Some(cx));
            }
        }
        let record = CheckRecord {
            check: Check::ExampleReplay,
            outcome: CheckOutcome::Passed,
            detail: format!("{} examples reproduced", examples.len()),
        };
        (record, None)
    }

    // ── Check 2 ──

    fn type_consistency(&self, expr: &Expression, signature: &ProblemSignature) -> CheckRecord {
        let (outcome, detail) = match expr.infer_type(self.table, &signature.inputs) {
            Ok(ty) if ty == signature.output => (CheckOutcome::Passed, format!("well-typed as {}", signature)),
            Ok(ty) => (
                CheckOutcome::Failed,
                format!("result type {} does not match {}", ty, signature.output),
            ),
            Err(e) => (CheckOutcome::Failed, e.to_string()),
        };
        CheckRecord {
            check: Check::TypeConsistency,
            outcome,
            detail,
        }
    }

    // ── Check 3 ──

    fn explore_paths(
        &self,
        evaluator: &Evaluator<'_>,
        expr: &Expression,
        signature: &ProblemSignature,
        examples: &[IOExample],
        notes: &mut Vec<String>,
    ) -> CheckRecord {
        let sites = conditional_sites(expr, evaluator);
        if sites.is_empty() {
            return CheckRecord {
                check: Check::PathExploration,
                outcome: CheckOutcome::Passed,
                detail: "no conditionals".into(),
            };
        }

        let total = 1usize.checked_shl(sites.len() as u32).unwrap_or(usize::MAX);
        let explored = total.min(self.path_budget);
        let mut untested = 0;
        let mut ill_typed = 0;
        let mut violating = 0;

        for bits in 0..explored {
            let assignment: HashMap<Path, bool> = sites
                .iter()
                .enumerate()
                .map(|(i, site)| (site.clone(), bits.checked_shr(i as u32).map_or(false, |b| b & 1 == 1)))
                .collect();

            let mut exercised = false;
            for ex in examples {
                let run = eval_forced(evaluator, expr, &ex.inputs, &assignment);
                if let Ok(v) = &run.value {
                    if v.first_order_type().as_ref() != Some(&signature.output) {
                        ill_typed += 1;
                    }
                }
                if run.natural {
                    exercised = true;
                    if run.value.as_ref().ok() != Some(&ex.output) {
                        violating += 1;
                    }
                }
            }
            if !exercised {
                untested += 1;
            }
        }

        let truncated = explored < total;
        if truncated {
            notes.push(format!(
                "path exploration truncated at {} of {} assignments",
                explored, total
            ));
        }
        if untested > 0 {
            notes.push(format!("{} of {} explored paths have no supporting example", untested, explored));
        }

        let outcome = if untested == 0 && ill_typed == 0 && violating == 0 && !truncated {
            CheckOutcome::Passed
        } else {
            CheckOutcome::Downgraded
        };
        CheckRecord {
            check: Check::PathExploration,
            outcome,
            detail: format!(
                "{} conditionals, {} paths explored, {} untested, {} ill-typed, {} violating",
                sites.len(),
                explored,
                untested,
                ill_typed,
                violating
            ),
        }
    }

    // ── Check 4 ──

    fn termination(
        &self,
        evaluator: &Evaluator<'_>,
        expr: &Expression,
        signature: &ProblemSignature,
        examples: &[IOExample],
        notes: &mut Vec<String>,
    ) -> CheckRecord {
        if !self.uses_fixpoint(expr) {
            return CheckRecord {
                check: Check::TerminationBound,
                outcome: CheckOutcome::Passed,
                detail: "no fixpoint".into(),
            };
        }

        let mut inputs: Vec<Vec<Value>> = examples.iter().map(|e| e.inputs.clone()).collect();
        inputs.extend(probe_inputs(&signature.inputs, self.probe_limit));
        let diverged: Vec<&Vec<Value>> = inputs
            .iter()
            .filter(|args| {
                matches!(evaluator.eval(expr, args), Err(ref e) if e.is_non_termination())
            })
            .collect();

        if diverged.is_empty() {
            CheckRecord {
                check: Check::TerminationBound,
                outcome: CheckOutcome::Passed,
                detail: format!(
                    "fixpoint converged within {} iterations on {} inputs",
                    self.limits.fix_iteration_cap,
                    inputs.len()
                ),
            }
        } else {
            let first: Vec<String> = diverged[0].iter().map(|v| v.to_string()).collect();
            notes.push(format!("iteration cap exceeded on input ({})", first.join(", ")));
            CheckRecord {
                check: Check::TerminationBound,
                outcome: CheckOutcome::Downgraded,
                detail: format!(
                    "iteration cap {} exceeded on {} of {} inputs",
                    self.limits.fix_iteration_cap,
                    diverged.len(),
                    inputs.len()
                ),
            }
        }
    }

    /// Whether `expr` applies `fix`, directly, through a closure or through
    /// the body of a learned primitive.
    fn uses_fixpoint(&self, expr: &Expression) -> bool {
        let mut visited = HashSet::new();
        self.reaches_fixpoint(expr, &mut visited)
    }

    fn reaches_fixpoint(&self, expr: &Expression, visited: &mut HashSet<PrimitiveId>) -> bool {
        let mut learned = Vec::new();
        let direct = expr.any_application(&mut |id| match self.table.get(id).map(|p| &p.rule) {
            Some(PrimitiveRule::Builtin(b)) => *b == Builtin::Fix,
            Some(PrimitiveRule::Learned { .. }) => {
                learned.push(id);
                false
            }
            None => false,
        });
        if direct {
            return true;
        }
        learned.into_iter().any(|id| {
            if !visited.insert(id) {
                return false;
            }
            match self.table.get(id).map(|p| &p.rule) {
                Some(PrimitiveRule::Learned { body }) => self.reaches_fixpoint(body, visited),
                _ => false,
            }
        })
    }
}
