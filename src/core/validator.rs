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


//! Action and name validation
//!
//! This module implements whitelist-style checks on everything that ends up
//! verbatim in the engine document:
//! - Shell commands, URIs and application names (length, control characters)
//! - Input-source and bundle-identifier matchers (must be valid regexes,
//!   because the engine treats them as regular expressions)
//! - Raw engine events (any `key_code` must be in the key vocabulary)
//! - State variable names
//!
//! The engine silently ignores malformed entries, so catching them here is
//! the only way an author hears about them.

use regex::Regex;
use thiserror::Error;

use crate::core::keys::{KeyCode, KeyError};
use crate::core::types::{Action, RawBinding};
use crate::karabiner::ToEvent;

/// Maximum length for commands, URIs and names
pub const MAX_ARGUMENT_LENGTH: usize = 1000;

/// Validation errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Argument is empty or whitespace
    #[error("Empty {0}")]
    EmptyArgument(&'static str),

    /// Argument exceeds maximum length
    #[error("Argument too long: {0} characters (max 1000)")]
    ArgumentTooLong(usize),

    /// Newlines, NUL and other control characters are never meaningful here
    #[error("Control characters detected in '{0}'")]
    ControlCharacters(String),

    /// Matcher is not a valid regular expression
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Variable name is empty or contains whitespace
    #[error("Invalid variable name '{0}'")]
    InvalidVariableName(String),

    /// Raw event refers to a key outside the vocabulary
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Checks a free-form argument (command, URI, application name)
pub fn validate_argument(kind: &'static str, argument: &str) -> Result<(), ValidationError> {
    if argument.trim().is_empty() {
        return Err(ValidationError::EmptyArgument(kind));
    }

    // Check length limit
    if argument.len() > MAX_ARGUMENT_LENGTH {
        return Err(ValidationError::ArgumentTooLong(argument.len()));
    }

    if argument.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacters(argument.to_string()));
    }

    Ok(())
}

/// Checks that a matcher compiles as a regular expression
pub fn validate_pattern(pattern: &str) -> Result<(), ValidationError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Validates variable name format
///
/// Accepts any non-empty name without whitespace or control characters.
pub fn validate_variable_name(name: &str) -> Result<(), ValidationError> {
    let valid = !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || c.is_control());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidVariableName(name.to_string()))
    }
}

/// Validates one action before it is encoded
pub fn validate_action(action: &Action) -> Result<(), ValidationError> {
    match action {
        // Chords are built from the vocabulary, nothing left to check
        Action::KeyChord(_) => Ok(()),
        Action::ShellCommand { command } => validate_argument("shell command", command),
        Action::OpenTarget { uri } => validate_argument("URI", uri),
        Action::LaunchApp { name } => validate_argument("application name", name),
        Action::SelectInputSource(selector) => {
            let mut patterns = selector.patterns().peekable();
            if patterns.peek().is_none() {
                return Err(ValidationError::EmptyArgument("input source matcher"));
            }
            patterns.try_for_each(validate_pattern)
        }
    }
}

/// Validates the literal events of a raw binding
pub fn validate_raw_binding(raw: &RawBinding) -> Result<(), ValidationError> {
    if raw.to.is_empty() {
        return Err(ValidationError::EmptyArgument("raw binding"));
    }

    validate_events(&raw.to)
}

/// Validates engine events that are emitted verbatim
pub fn validate_events(events: &[ToEvent]) -> Result<(), ValidationError> {
    for event in events {
        match event {
            ToEvent::SetVariable { set_variable, .. } => validate_variable_name(&set_variable.name)?,
            ToEvent::ShellCommand { shell_command, .. } => {
                validate_argument("shell command", shell_command)?
            }
            ToEvent::SelectInputSource {
                select_input_source, ..
            } => select_input_source.patterns().try_for_each(validate_pattern)?,
            ToEvent::Key(_) => {}
            // Unknown shapes pass through, but a key_code inside one must
            // still come from the vocabulary
            ToEvent::Raw(value) => {
                if let Some(name) = value.get("key_code").and_then(|v| v.as_str()) {
                    KeyCode::parse(name)?;
                }
            }
        }
    }

    Ok(())
}
