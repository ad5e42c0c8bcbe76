//! Property tests: with elitism the best fitness never decreases.

use std::time::Duration;

use maple_synth_genetic::GeneticEngine;
use maple_synth_registry::CapabilityRegistry;
use maple_synth_tests::small_genetic_config;
use proptest::prelude::*;

use crate::strategies::{arb_linear_examples, arb_unary_examples};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn best_fitness_is_monotone(examples in arb_unary_examples(), seed in 0u64..1000) {
        let registry = CapabilityRegistry::with_builtins();
        let result = GeneticEngine::new(&registry, small_genetic_config(seed))
            .evolve(&examples, Duration::from_secs(30))
            .unwrap();
        for pair in result.history.windows(2) {
            prop_assert!(pair[1].best >= pair[0].best, "{} then {}", pair[0].best, pair[1].best);
        }
        let peak = result.history.iter().map(|g| g.best).fold(0.0, f64::max);
        prop_assert!(result.best.fitness.score() >= peak);
    }

    #[test]
    fn perfect_runs_stop_early(examples in arb_linear_examples(), seed in 0u64..1000) {
        let registry = CapabilityRegistry::with_builtins();
        let config = small_genetic_config(seed).with_population(32, 20);
        let result = GeneticEngine::new(&registry, config)
            .evolve(&examples, Duration::from_secs(30))
            .unwrap();
        if result.is_perfect() {
            prop_assert!(result.generations_run <= 20);
            prop_assert_eq!(result.history.last().map(|g| g.best), Some(1.0));
        } else {
            prop_assert_eq!(result.generations_run, 20);
        }
    }
}
