//! End-to-end test: examples with a zero divisor never crash the search;
//! candidates that fail on them are discarded and the search continues.

use std::time::Duration;

use maple_synth_enumerator::Enumerator;
use maple_synth_orchestrator::Orchestrator;
use maple_synth_registry::CapabilityRegistry;
use maple_synth_tests::{binary_examples, test_config};
use maple_synth_types::{EvalLimits, Evaluator, Value};

const PAIRS: [(i64, i64); 6] = [(6, 0), (2, 3), (4, 2), (0, 5), (3, 3), (5, 1)];

#[test]
fn failing_candidates_are_discarded() {
    let registry = CapabilityRegistry::with_builtins();
    let examples = binary_examples(&PAIRS, |x, y| x * y + 1);
    let result = Enumerator::new(&registry, &test_config())
        .synthesize(&examples, 7, Duration::from_secs(30))
        .unwrap();

    assert!(result.stats.discarded_failures > 0);
    let solution = result.solution.unwrap();
    assert!(solution.size <= 5);

    let evaluator = Evaluator::new(&registry, EvalLimits::default());
    for ex in &examples {
        assert_eq!(evaluator.eval(&solution.expression, &ex.inputs).as_ref(), Ok(&ex.output));
    }
    assert_eq!(
        evaluator.eval(&solution.expression, &[Value::Int(7), Value::Int(8)]),
        Ok(Value::Int(57))
    );
}

#[test]
fn orchestrator_survives_zero_divisors() {
    let mut orch = Orchestrator::new(test_config()).unwrap();
    let examples = binary_examples(&PAIRS, |x, y| x * y + 1);
    let program = orch.solve_problem(&examples, true).unwrap().unwrap();
    assert!(program.is_verified());
    assert_eq!(program.call(&[Value::Int(6), Value::Int(0)]), Ok(Value::Int(1)));
}

#[test]
fn division_by_zero_is_reported_by_the_program() {
    let mut orch = Orchestrator::new(test_config()).unwrap();
    let examples = binary_examples(&[(6, 2), (9, 3), (8, 4), (7, 7)], |x, y| x / y);
    let program = orch.solve_problem(&examples, true).unwrap().unwrap();
    assert_eq!(program.rendering, "div(x0, x1)");
    assert!(program.call(&[Value::Int(1), Value::Int(0)]).is_err());
}
