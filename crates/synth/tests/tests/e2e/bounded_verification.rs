//! End-to-end test: bounded verification downgrades but never rejects
//! programs with untested branches or suspect fixpoints.

use maple_synth_orchestrator::Orchestrator;
use maple_synth_tests::{test_config, unary_examples};
use maple_synth_types::{Expression, PrimitiveTable, ProblemSignature};
use maple_synth_verifier::{Check, CheckOutcome, VerificationMethod, Verifier};

fn id(orch: &Orchestrator, name: &str) -> maple_synth_types::PrimitiveId {
    orch.registry().find(name).unwrap().id
}

#[test]
fn untested_branch_is_admissible_but_unverified() {
    let orch = Orchestrator::new(test_config()).unwrap();
    // if(lt(x0, 0), neg(x0), x0) is |x|, but every example is non-negative.
    let abs = Expression::apply(
        id(&orch, "if"),
        vec![
            Expression::apply(id(&orch, "lt"), vec![Expression::var(0), Expression::int(0)]),
            Expression::apply(id(&orch, "neg"), vec![Expression::var(0)]),
            Expression::var(0),
        ],
    );
    let examples = unary_examples(0..4, |x| x);
    let signature = ProblemSignature::infer(&examples).unwrap();
    let result = Verifier::new(orch.registry(), orch.config()).verify(&abs, &signature, &examples);

    assert!(result.admissible);
    assert!(!result.verified);
    assert_eq!(result.method, VerificationMethod::Bounded);
    assert_eq!(result.verdict(), "unverified: untested branch");
    assert_eq!(result.outcome_of(Check::PathExploration), Some(CheckOutcome::Downgraded));

    // With a negative example both branches are exercised.
    let examples = unary_examples(-2..3, |x| x.abs());
    let signature = ProblemSignature::infer(&examples).unwrap();
    let result = Verifier::new(orch.registry(), orch.config()).verify(&abs, &signature, &examples);
    assert!(result.verified, "{}", result.certificate());
}

#[test]
fn counterexample_is_reported() {
    let mut orch = Orchestrator::new(test_config()).unwrap();
    let program = orch
        .solve_problem(&unary_examples(0..3, |x| x + 1), true)
        .unwrap()
        .unwrap();

    let wider = unary_examples(0..3, |x| x + 2);
    let result = orch.verify(&program, &program.signature, &wider);
    assert!(!result.admissible);
    let cx = result.counterexample.unwrap();
    assert_eq!(cx.to_string(), "(0) expected 2, got 1");
}
