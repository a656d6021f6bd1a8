//! Config module tests
//!
//! Contains test suites for output management:
//! - ConfigManager (backups, listing, cleanup, restore)
//! - ConfigTransaction (commit, validation, rollback)
//! - DocumentValidator
//! - The spec → output build
//! - Spec file loading and document building

#[cfg(test)]
mod pipeline_tests;
#[cfg(test)]
mod spec_file_tests;
#[cfg(test)]
mod transaction_tests;
