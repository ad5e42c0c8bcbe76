#[path = "e2e/successor.rs"]
mod successor;

#[path = "e2e/doubling.rs"]
mod doubling;

#[path = "e2e/capability_emergence.rs"]
mod capability_emergence;

#[path = "e2e/guarded_division.rs"]
mod guarded_division;

#[path = "e2e/bounded_verification.rs"]
mod bounded_verification;
