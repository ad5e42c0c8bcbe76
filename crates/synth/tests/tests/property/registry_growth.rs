//! Property tests: the registry only grows, and semantically identical
//! capabilities are never admitted twice.

use maple_synth_registry::RegistrationOutcome;
use maple_synth_tests::arithmetic_registry;
use maple_synth_types::{PrimitiveTable, Signature, Type};
use proptest::prelude::*;

use crate::strategies::arb_expression;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn append_only_with_dedup(bodies in prop::collection::vec(arb_expression(1, 2), 1..8)) {
        let mut registry = arithmetic_registry();
        let signature = Signature::new(vec![Type::Int], Type::Int);
        let mut size = registry.len();
        let names_before = registry.names();

        for (i, body) in bodies.iter().enumerate() {
            let outcome = registry
                .register(format!("cap_{}", i), signature.clone(), body.clone(), 1)
                .unwrap();
            prop_assert!(registry.len() >= size);
            prop_assert_eq!(registry.len(), size + usize::from(outcome.is_admitted()));
            size = registry.len();
        }
        prop_assert_eq!(&registry.names()[..names_before.len()], &names_before[..]);

        // Every body is now represented; registering it again is a no-op.
        for (i, body) in bodies.iter().enumerate() {
            let outcome = registry
                .register(format!("again_{}", i), signature.clone(), body.clone(), 1)
                .unwrap();
            let is_duplicate = matches!(outcome, RegistrationOutcome::Duplicate { .. });
            prop_assert!(is_duplicate);
            prop_assert_eq!(registry.len(), size);
        }
    }
}
