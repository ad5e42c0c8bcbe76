//! Property tests: a verified program reproduces every example exactly.

use maple_synth_tests::{arithmetic_registry, test_config};
use maple_synth_types::{EvalLimits, Evaluator, IOExample, ProblemSignature, Value};
use maple_synth_verifier::{Check, CheckOutcome, Verifier};
use proptest::prelude::*;

use crate::strategies::arb_expression;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn verified_implies_replay(
        program in arb_expression(1, 2),
        generator in arb_expression(1, 2),
    ) {
        let registry = arithmetic_registry();
        let evaluator = Evaluator::new(&registry, EvalLimits::default());
        // Examples come from a second random program, so some candidates
        // match and most do not.
        let examples: Vec<IOExample> = (-2..3)
            .map(|x| {
                let inputs = vec![Value::Int(x)];
                let output = evaluator.eval(&generator, &inputs).unwrap();
                IOExample::new(inputs, output)
            })
            .collect();
        let signature = ProblemSignature::infer(&examples).unwrap();
        let result = Verifier::new(&registry, &test_config()).verify(&program, &signature, &examples);

        if result.verified {
            for ex in &examples {
                prop_assert_eq!(evaluator.eval(&program, &ex.inputs).ok(), Some(ex.output.clone()));
            }
            prop_assert_eq!(result.confidence, 1.0);
        }
        if !result.admissible {
            prop_assert!(!result.verified);
        }
        let replay_failed = result.outcome_of(Check::ExampleReplay) == Some(CheckOutcome::Failed);
        prop_assert_eq!(result.counterexample.is_some(), replay_failed);
        prop_assert!(result.checks.iter().all(|c| c.outcome != CheckOutcome::Failed) == result.admissible);
    }
}
