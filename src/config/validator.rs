// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Document-level validation
//!
//! Runs after compilation and before anything is written. The compiler's
//! own output should always pass; these checks mostly guard passthrough
//! rules and hand-written raw bindings, which the compiler emits as given.
//!
//! - **Errors** (block the commit): a variable set to 1 on key-down that the
//!   same manipulator does not reset on key-up, manipulators that shadow each
//!   other, invalid verbatim events
//! - **Warnings** (commit proceeds): empty rules, empty profile list
//!
//! # Example
//! ```
//! use hyper_sublayers::config::validator::DocumentValidator;
//! use hyper_sublayers::karabiner::Document;
//!
//! let document = Document::default();
//! let report = DocumentValidator::new().validate(&document);
//!
//! assert!(!report.has_errors());
//! ```

use std::collections::HashSet;

use crate::core::conflict::ConflictDetector;
use crate::core::validator::validate_events;
use crate::karabiner::{Document, Manipulator, Profile, ToEvent};

/// Validation severity level
///
/// - **Error**: Blocks commit
/// - **Warning**: Allows commit but is reported
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationLevel {
    Error,
    Warning,
}

/// A single issue found in the document
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    /// Description of the rule with the issue (empty for document-wide issues)
    pub rule: String,
    pub validation_level: ValidationLevel,
    /// Human-readable description of the issue
    pub message: String,
    /// Optional suggestion for fixing the issue
    pub suggestion: Option<String>,
}

/// All issues found in one document
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Returns true if the report contains any Error-level issues
    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.validation_level == ValidationLevel::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.validation_level == ValidationLevel::Warning)
    }

    /// Adds an Error-level issue to the report
    pub fn add_error(&mut self, rule: &str, message: String, suggestion: Option<String>) {
        self.issues.push(ValidationIssue {
            rule: rule.to_string(),
            validation_level: ValidationLevel::Error,
            message,
            suggestion,
        });
    }

    /// Adds a Warning-level issue to the report
    pub fn add_warning(&mut self, rule: &str, message: String, suggestion: Option<String>) {
        self.issues.push(ValidationIssue {
            rule: rule.to_string(),
            validation_level: ValidationLevel::Warning,
            message,
            suggestion,
        });
    }
}

/// Checks a generated document before it is committed
#[derive(Default)]
pub struct DocumentValidator;

impl DocumentValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates every profile of `document`
    pub fn validate(&self, document: &Document) -> ValidationReport {
        let mut report = ValidationReport::new();

        if document.profiles.is_empty() {
            report.add_warning("", "Document has no profiles".to_string(), None);
        }

        for profile in &document.profiles {
            self.validate_profile(profile, &mut report);
        }

        report
    }

    fn validate_profile(&self, profile: &Profile, report: &mut ValidationReport) {
        let rules = &profile.complex_modifications.rules;

        for rule in rules {
            if rule.manipulators.is_empty() {
                report.add_warning(
                    &rule.description,
                    "Rule has no manipulators".to_string(),
                    Some("Remove the rule or add a manipulator".to_string()),
                );
            }

            for manipulator in &rule.manipulators {
                for variable in held_without_release(manipulator) {
                    report.add_error(
                        &rule.description,
                        format!("Variable '{}' is set to 1 but never reset on key-up", variable),
                        Some(format!(
                            "Set '{}' to 0 in to_after_key_up of the same manipulator",
                            variable
                        )),
                    );
                }

                let verbatim = manipulator
                    .to
                    .iter()
                    .chain(&manipulator.to_if_alone)
                    .chain(&manipulator.to_after_key_up)
                    .cloned()
                    .collect::<Vec<ToEvent>>();
                if let Err(e) = validate_events(&verbatim) {
                    report.add_error(&rule.description, format!("Invalid event: {}", e), None);
                }
            }
        }

        for conflict in ConflictDetector::from_rules(rules).find_conflicts() {
            let sources = conflict
                .manipulators
                .iter()
                .map(|l| l.rule.as_str())
                .collect::<Vec<_>>()
                .join(", ");

            let conditions = conflict
                .trigger
                .conditions
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" && ");

            report.add_error(
                &conflict.manipulators[0].rule,
                format!(
                    "Profile '{}': {} manipulators for '{}' when [{}] ({})",
                    profile.name,
                    conflict.manipulators.len(),
                    conflict.trigger.from.key_code,
                    conditions,
                    sources
                ),
                Some("Only the first one can ever fire".to_string()),
            );
        }
    }
}

/// Variables set to 1 on key-down that the same manipulator does not clear
/// on key-up (through `to_after_key_up` or a `key_up_value` of 0)
fn held_without_release(manipulator: &Manipulator) -> Vec<&str> {
    let released = manipulator.sets_after_key_up(0).collect::<HashSet<_>>();

    manipulator
        .to
        .iter()
        .filter_map(|event| match event {
            ToEvent::SetVariable { set_variable, .. }
                if set_variable.value == 1 && set_variable.key_up_value != Some(0) =>
            {
                Some(set_variable.name.as_str())
            }
            _ => None,
        })
        .filter(|name| !released.contains(name))
        .collect()
}
