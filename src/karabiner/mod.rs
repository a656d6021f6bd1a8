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


//! Karabiner-Elements document model
//!
//! Serde types for the parts of `karabiner.json` this crate writes:
//! the top-level document, profiles, complex-modification rules, and the
//! manipulators inside them. Field names and shapes follow the engine's
//! JSON schema exactly; empty collections are omitted on output so the
//! generated file stays close to what a person would write by hand.
//!
//! The engine evaluates manipulators in order and the first one whose
//! conditions hold wins. Nothing in this module evaluates conditions.

use crate::core::keys::{KeyCode, Modifier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Complete `karabiner.json` document
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Document {
    /// Engine-wide settings, passed through untouched
    #[serde(default)]
    pub global: Map<String, Value>,

    /// Profiles in output order
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl Document {
    /// Renders the document the way the engine's own tooling does
    /// (two-space indentation, trailing newline)
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parses a previously written document
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Iterates every rule across all profiles with its profile name
    pub fn rules(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.profiles.iter().flat_map(|profile| {
            profile
                .complex_modifications
                .rules
                .iter()
                .map(move |rule| (profile.name.as_str(), rule))
        })
    }
}

/// A named profile
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Profile {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,

    #[serde(default)]
    pub complex_modifications: ComplexModifications,
}

/// The `complex_modifications` section of a profile
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ComplexModifications {
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A human-labelled block of manipulators
///
/// Rules are organisational only; no invariant spans rule boundaries.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Rule {
    pub description: String,
    pub manipulators: Vec<Manipulator>,
}

/// Manipulator type; this crate only emits `basic`
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManipulatorKind {
    #[default]
    Basic,
}

/// One atomic input-to-output remapping
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Manipulator {
    #[serde(rename = "type", default)]
    pub kind: ManipulatorKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub from: FromEvent,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<ToEvent>,

    /// Fires instead of `to` when the key is pressed and released alone
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_if_alone: Vec<ToEvent>,

    /// Fires on key release regardless of how the press was consumed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to_after_key_up: Vec<ToEvent>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Engine fields this crate does not model (`parameters`,
    /// `to_if_held_down` …), kept for passthrough rules
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Manipulator {
    /// A `basic` manipulator triggered by `from` with nothing attached yet
    pub fn basic(from: FromEvent) -> Self {
        Self {
            kind: ManipulatorKind::Basic,
            description: None,
            from,
            to: Vec::new(),
            to_if_alone: Vec::new(),
            to_after_key_up: Vec::new(),
            conditions: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Variables this manipulator sets to `value` in its `to` list
    pub fn sets_in_to(&self, value: i64) -> impl Iterator<Item = &str> {
        variables_set(&self.to, value)
    }

    /// Variables this manipulator sets to `value` on key release
    pub fn sets_after_key_up(&self, value: i64) -> impl Iterator<Item = &str> {
        variables_set(&self.to_after_key_up, value)
    }
}

fn variables_set(events: &[ToEvent], value: i64) -> impl Iterator<Item = &str> {
    events.iter().filter_map(move |event| match event {
        ToEvent::SetVariable { set_variable, .. } if set_variable.value == value => {
            Some(set_variable.name.as_str())
        }
        _ => None,
    })
}

/// The physical event a manipulator listens for
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct FromEvent {
    pub key_code: KeyCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<FromModifiers>,
}

impl FromEvent {
    /// Matches `key` whatever modifiers are held
    pub fn any_modifiers(key_code: KeyCode) -> Self {
        Self {
            key_code,
            modifiers: Some(FromModifiers {
                mandatory: Vec::new(),
                optional: vec![Modifier::Any],
            }),
        }
    }
}

/// Modifier constraints on a `from` event
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct FromModifiers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mandatory: Vec<Modifier>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<Modifier>,
}

/// A `set_variable` payload
///
/// Unknown fields are rejected so that an unmodelled payload falls through
/// to `ToEvent::Raw` instead of losing fields.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VariableAssignment {
    pub name: String,
    pub value: i64,

    /// Value the engine assigns when the triggering key is released
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_up_value: Option<i64>,
}

/// Input source matcher; every present field is a regular expression
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct InputSourceSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_source_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_mode_id: Option<String>,
}

impl InputSourceSelector {
    /// Every regular expression carried by the selector
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        [&self.input_source_id, &self.language, &self.input_mode_id]
            .into_iter()
            .filter_map(|p| p.as_deref())
    }
}

impl fmt::Display for InputSourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            ("id", &self.input_source_id),
            ("lang", &self.language),
            ("mode", &self.input_mode_id),
        ];
        let rendered = parts
            .iter()
            .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}={}", label, v)))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&rendered)
    }
}

/// One output event
///
/// Untagged: the engine distinguishes event kinds by which field is present.
/// Anything not recognised round-trips through `Raw` unchanged.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToEvent {
    SetVariable {
        set_variable: VariableAssignment,
        #[serde(flatten, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
    ShellCommand {
        shell_command: String,
        #[serde(flatten, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
    SelectInputSource {
        select_input_source: InputSourceSelector,
        #[serde(flatten, skip_serializing_if = "Map::is_empty")]
        extra: Map<String, Value>,
    },
    Key(KeyEvent),
    Raw(Value),
}

/// A key press event, optionally with modifiers
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct KeyEvent {
    pub key_code: KeyCode,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub lazy: bool,

    /// Engine options this crate does not model (`repeat`, `halt` …)
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ToEvent {
    /// `set_variable` event
    pub fn set_variable(name: &str, value: i64) -> Self {
        ToEvent::SetVariable {
            set_variable: VariableAssignment {
                name: name.to_string(),
                value,
                key_up_value: None,
            },
            extra: Map::new(),
        }
    }

    /// `shell_command` event
    pub fn shell_command(command: impl Into<String>) -> Self {
        ToEvent::ShellCommand {
            shell_command: command.into(),
            extra: Map::new(),
        }
    }

    /// `select_input_source` event
    pub fn select_input_source(selector: InputSourceSelector) -> Self {
        ToEvent::SelectInputSource {
            select_input_source: selector,
            extra: Map::new(),
        }
    }

    /// Plain key press without modifiers
    pub fn key(key_code: KeyCode) -> Self {
        Self::chord(key_code, Vec::new())
    }

    /// Key press with modifiers held
    pub fn chord(key_code: KeyCode, modifiers: Vec<Modifier>) -> Self {
        ToEvent::Key(KeyEvent {
            key_code,
            modifiers,
            lazy: false,
            extra: Map::new(),
        })
    }
}

/// Gating predicate attached to a manipulator
///
/// Opaque to the compiler: it attaches conditions, the engine evaluates them.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    VariableIf { name: String, value: i64 },
    VariableUnless { name: String, value: i64 },
    FrontmostApplicationIf { bundle_identifiers: Vec<String> },
    FrontmostApplicationUnless { bundle_identifiers: Vec<String> },
}

impl Condition {
    pub fn variable_if(name: &str, value: i64) -> Self {
        Condition::VariableIf {
            name: name.to_string(),
            value,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::VariableIf { name, value } => write!(f, "{} == {}", name, value),
            Condition::VariableUnless { name, value } => write!(f, "{} != {}", name, value),
            Condition::FrontmostApplicationIf { bundle_identifiers } => {
                write!(f, "frontmost in [{}]", bundle_identifiers.join(", "))
            }
            Condition::FrontmostApplicationUnless { bundle_identifiers } => {
                write!(f, "frontmost not in [{}]", bundle_identifiers.join(", "))
            }
        }
    }
}
