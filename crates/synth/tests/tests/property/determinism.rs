//! Property tests: identical examples, configuration and seed give
//! identical results.

use std::time::Duration;

use maple_synth_enumerator::Enumerator;
use maple_synth_genetic::GeneticEngine;
use maple_synth_registry::CapabilityRegistry;
use maple_synth_tests::{small_genetic_config, test_config};
use proptest::prelude::*;

use crate::strategies::{arb_linear_examples, arb_unary_examples};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn enumeration_is_repeatable(examples in arb_linear_examples()) {
        let registry = CapabilityRegistry::with_builtins();
        let config = test_config().with_max_size(5);
        let run = || {
            Enumerator::new(&registry, &config)
                .synthesize(&examples, 5, Duration::from_secs(30))
                .unwrap()
        };
        let (a, b) = (run(), run());
        prop_assert_eq!(a.solution, b.solution);
        prop_assert_eq!(a.stats.candidates, b.stats.candidates);
    }

    #[test]
    fn evolution_is_repeatable(examples in arb_unary_examples(), seed in 0u64..1000) {
        let registry = CapabilityRegistry::with_builtins();
        let run = || {
            GeneticEngine::new(&registry, small_genetic_config(seed))
                .evolve(&examples, Duration::from_secs(30))
                .unwrap()
        };
        let (a, b) = (run(), run());
        prop_assert_eq!(a.best.expression, b.best.expression);
        prop_assert_eq!(a.generations_run, b.generations_run);
        prop_assert_eq!(a.history.len(), b.history.len());
    }
}
