//! Property tests: every example set realizable at depth <= 2 over the
//! arithmetic vocabulary is solved within size 7, and never by a larger
//! program than the one that generated it.

use std::time::Duration;

use maple_synth_enumerator::Enumerator;
use maple_synth_tests::{arithmetic_registry, test_config};
use maple_synth_types::{EvalLimits, Evaluator, IOExample, Value};
use proptest::prelude::*;

use crate::strategies::arb_expression;

const INPUTS: [(i64, i64); 5] = [(0, 1), (2, 3), (-1, 4), (5, -2), (3, 3)];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn depth_two_targets_are_found(target in arb_expression(2, 2)) {
        let registry = arithmetic_registry();
        let evaluator = Evaluator::new(&registry, EvalLimits::default());
        let examples: Vec<IOExample> = INPUTS
            .iter()
            .map(|&(x, y)| {
                let inputs = vec![Value::Int(x), Value::Int(y)];
                let output = evaluator.eval(&target, &inputs).unwrap();
                IOExample::new(inputs, output)
            })
            .collect();

        let result = Enumerator::new(&registry, &test_config())
            .synthesize(&examples, 7, Duration::from_secs(30))
            .unwrap();
        let solution = result.solution.expect("realizable target must be found");

        prop_assert!(solution.size <= target.size(&registry));
        for ex in &examples {
            prop_assert_eq!(evaluator.eval(&solution.expression, &ex.inputs).unwrap(), ex.output.clone());
        }
    }
}
