#![deny(unsafe_code)]
//! # maple-synth-types
//!
//! Shared vocabulary for example-driven program synthesis: values and
//! types, primitives, typed expression trees, the guarded evaluator,
//! input/output examples and the synthesis configuration.
//!
//! Expressions refer to primitives by [`PrimitiveId`]; everything that
//! needs to resolve an id takes a [`PrimitiveTable`] by reference.

pub mod config;
pub mod error;
pub mod eval;
pub mod example;
pub mod expr;
pub mod primitive;
pub mod probe;
pub mod terminals;
pub mod value;

pub use config::{Constraints, SynthesisConfig};
pub use error::{SynthError, SynthResult};
pub use eval::{EvalError, EvalLimits, Evaluator};
pub use example::{IOExample, ProblemSignature};
pub use expr::{closure_type, Expression, Path};
pub use primitive::{builtin_table, Builtin, Primitive, PrimitiveId, PrimitiveRule, PrimitiveTable, Signature};
pub use probe::{probe_inputs, probe_values};
pub use terminals::{function_param_types, terminals};
pub use value::{Closure, Type, Value};
