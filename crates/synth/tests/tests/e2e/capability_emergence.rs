//! End-to-end test: a target out of reach of the seed table becomes
//! solvable once a curriculum has admitted the stepping-stone capabilities.

use maple_synth_orchestrator::Orchestrator;
use maple_synth_tests::{test_config, unary_examples};
use maple_synth_types::{IOExample, Value};

fn power(exponent: u32) -> Vec<IOExample> {
    unary_examples(0..=5, |x| x.pow(exponent))
}

#[test]
fn curriculum_unlocks_sixteenth_power() {
    let mut orch = Orchestrator::new(test_config()).unwrap();
    let target = power(16);
    let size_before = orch.capabilities().total();

    assert!(orch.synthesize(&target, None).unwrap().is_none());

    let admitted = orch.learn_and_expand(&[power(2), power(4)]).unwrap();
    assert_eq!(admitted, 2);
    assert_eq!(orch.capabilities().learned, vec!["learned_1", "learned_2"]);

    let program = orch.synthesize(&target, None).unwrap().unwrap();
    assert!(program.is_verified());
    // x^16 within the size and depth budgets needs x^4 as a primitive.
    assert!(program.rendering.contains("learned_2"));
    assert_eq!(program.call(&[Value::Int(3)]), Ok(Value::Int(3i64.pow(16))));

    let ratio = orch.capabilities().total() as f64 / size_before as f64;
    assert!(ratio > 1.0);
}

#[test]
fn emergence_report() {
    let mut orch = Orchestrator::new(test_config()).unwrap();
    let report = orch.demonstrate_emergence().unwrap();

    assert!(!report.solvable_before);
    assert!(report.solvable_after);
    assert!(report.emerged());
    assert_eq!(report.capabilities_admitted, 2);
    assert_eq!(report.registry_size_after, report.registry_size_before + 2);
    assert!(report.expansion_ratio > 1.0);
    assert_eq!(report.curriculum, vec!["mul(x0, x0)", "learned_1(learned_1(x0))"]);
    assert!(report.solution_after.as_deref().is_some_and(|s| s.contains("learned_2")));

    let metrics = orch.metrics();
    assert_eq!(metrics.problems_attempted, 4);
    assert_eq!(metrics.problems_solved, 3);
    assert_eq!(metrics.capabilities_admitted, 2);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"solvable_after\":true"));
}

#[test]
fn duplicate_curriculum_is_not_admitted_twice() {
    let mut orch = Orchestrator::new(test_config()).unwrap();
    assert_eq!(orch.learn_and_expand(&[power(2)]).unwrap(), 1);
    assert_eq!(orch.learn_and_expand(&[power(2)]).unwrap(), 0);
    assert_eq!(orch.capabilities().learned.len(), 1);
}
