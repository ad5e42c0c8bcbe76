//! End-to-end test: f(0)=1, f(1)=2, f(2)=3 is solved by a small program
//! that generalizes.

use std::time::Duration;

use maple_synth_enumerator::Enumerator;
use maple_synth_orchestrator::Orchestrator;
use maple_synth_registry::CapabilityRegistry;
use maple_synth_tests::{test_config, unary_examples};
use maple_synth_types::{EvalLimits, Evaluator, Value};

#[test]
fn enumerator_finds_successor() {
    let registry = CapabilityRegistry::with_builtins();
    let examples = unary_examples(0..3, |x| x + 1);
    let result = Enumerator::new(&registry, &test_config())
        .synthesize(&examples, 5, Duration::from_secs(30))
        .unwrap();
    let solution = result.solution.unwrap();
    assert!(solution.size <= 5);

    let evaluator = Evaluator::new(&registry, EvalLimits::default());
    assert_eq!(
        evaluator.eval(&solution.expression, &[Value::Int(100)]),
        Ok(Value::Int(101))
    );
}

#[test]
fn orchestrator_returns_callable_program() {
    let mut orch = Orchestrator::new(test_config()).unwrap();
    let program = orch
        .synthesize(&unary_examples(0..3, |x| x + 1), None)
        .unwrap()
        .unwrap();
    assert_eq!(program.rendering, "add(x0, 1)");
    assert_eq!(program.strategy.as_str(), "enumerative");
    assert!(program.is_verified());
    assert_eq!(program.call(&[Value::Int(100)]), Ok(Value::Int(101)));
    assert!(program
        .verification
        .as_ref()
        .unwrap()
        .certificate()
        .contains("verdict: verified"));
}
