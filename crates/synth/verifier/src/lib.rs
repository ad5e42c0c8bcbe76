#![deny(unsafe_code)]
//! # maple-synth-verifier
//!
//! Bounded verification of candidate programs. Checks run in order:
//!
//! 1. **Example replay**: every example reproduces exactly.
//! 2. **Type consistency**: the program's static type is the problem's.
//! 3. **Path exploration**: each conditional branch assignment (up to a
//!    budget) is supported by at least one example and stays well-typed.
//! 4. **Termination bound**: fixpoints converge within the iteration cap
//!    on the examples and a fixed probe set.
//!
//! The first two are mandatory. The last two only lower confidence, so a
//! program can be admissible without being verified.

mod paths;
pub mod result;
pub mod verifier;

pub use result::{
    Check, CheckOutcome, CheckRecord, Counterexample, VerificationMethod, VerificationResult,
};
pub use verifier::Verifier;
