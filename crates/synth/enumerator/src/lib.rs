#![deny(unsafe_code)]
//! # maple-synth-enumerator
//!
//! Exhaustive bottom-up program search. Expressions are generated in
//! non-decreasing weighted size, composed from smaller retained
//! expressions, and pruned by observational equivalence: of all
//! candidates producing the same output vector on the examples, only the
//! first (and therefore cheapest) is kept.
//!
//! Generation order, which also breaks ties between equally sized
//! matches: variables, integer constants, booleans, the empty list and
//! function literals at size 1; then, per size, primitives in registration
//! order, argument-size splits in lexicographic order and bank entries in
//! insertion order.

mod bank;
pub mod enumerator;
pub mod stats;

pub use enumerator::{EnumerationResult, Enumerator, Solution};
pub use stats::{EnumerationStats, Exhaustion};
