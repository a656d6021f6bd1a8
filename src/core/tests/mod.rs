//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Layer compilation (scenarios, gating, ordering, determinism)
//! - Conflict detection over compiled manipulators
//! - Leaf notation parsing
//! - Action validation

#[cfg(test)]
mod conflict_tests;
