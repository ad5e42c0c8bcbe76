//! End-to-end test: f(x) = 2x on 0..4 passes every example and
//! generalizes to f(10) = 20.

use maple_synth_orchestrator::Orchestrator;
use maple_synth_tests::{test_config, unary_examples};
use maple_synth_types::Value;

#[test]
fn synthesized_doubling_generalizes() {
    let examples = unary_examples(0..5, |x| 2 * x);
    let mut orch = Orchestrator::new(test_config()).unwrap();
    let program = orch.synthesize(&examples, None).unwrap().unwrap();

    for ex in &examples {
        assert_eq!(program.call(&ex.inputs), Ok(ex.output.clone()));
    }
    assert_eq!(program.call(&[Value::Int(10)]), Ok(Value::Int(20)));
    assert!(program.is_verified());
}

#[test]
fn repeated_requests_are_stable() {
    let examples = unary_examples(0..5, |x| 2 * x);
    let mut first = Orchestrator::new(test_config()).unwrap();
    let mut second = Orchestrator::new(test_config()).unwrap();
    let a = first.solve_problem(&examples, true).unwrap().unwrap();
    let b = second.solve_problem(&examples, true).unwrap().unwrap();
    assert_eq!(a.expression, b.expression);
    assert_eq!(a.rendering, "add(x0, x0)");

    // The learner now prefers what worked for this problem shape.
    let insights = first.insights();
    assert_eq!(insights.successful_attempts, 1);
    assert_eq!(insights.preferred.values().next().map(|s| s.as_str()), Some("enumerative"));
}
