#[path = "property/strategies.rs"]
mod strategies;

#[path = "property/completeness.rs"]
mod completeness;

#[path = "property/determinism.rs"]
mod determinism;

#[path = "property/soundness.rs"]
mod soundness;

#[path = "property/elitism.rs"]
mod elitism;

#[path = "property/registry_growth.rs"]
mod registry_growth;
