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


//! src/core/types.rs
//!
//! Core type definitions for layer specifications
//!
//! This module defines the fundamental types used throughout the compiler:
//! - `KeyChord`: A key plus the modifiers held with it
//! - `Action`: The closed vocabulary of leaf effects
//! - `LayerNode` / `LayerMapping`: The nested, author-facing layer tree
//! - `LayerSpec`: A root mapping plus reusable named definitions
//! - `LeaderPath` / `StateVariable`: Addressing and state for compiled layers
//!
//! Everything here is plain data built once from the specification and never
//! mutated by the compiler.

use crate::core::keys::{KeyCode, Modifier};
use crate::karabiner::{Condition, InputSourceSelector, ToEvent};
use std::collections::HashMap;
use std::fmt;

/// A combination of modifier keys and a base key
///
/// Modifiers are normalised on construction (sorted into canonical ⌃⌥⇧⌘
/// order, duplicates removed) so equal chords compare and render equally.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct KeyChord {
    pub key: KeyCode,
    pub modifiers: Vec<Modifier>,
}

impl KeyChord {
    /// Create a new KeyChord with normalised modifiers
    pub fn new(key: KeyCode, mut modifiers: Vec<Modifier>) -> Self {
        modifiers.sort();
        modifiers.dedup();

        Self { key, modifiers }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        write!(f, "{}", self.key)
    }
}

/// Leaf effect bound to a key inside a layer
///
/// Closed on purpose: the encoder matches every variant, so adding one here
/// without an encoding fails to compile.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// Emit a key with modifiers
    KeyChord(KeyChord),
    /// Run a shell command
    ShellCommand { command: String },
    /// Open a URL or URI scheme with the system handler
    OpenTarget { uri: String },
    /// Launch (or focus) an application by name
    LaunchApp { name: String },
    /// Switch the active input source
    SelectInputSource(InputSourceSelector),
}

impl Action {
    pub fn key(chord: KeyChord) -> Self {
        Action::KeyChord(chord)
    }

    pub fn shell(command: impl Into<String>) -> Self {
        Action::ShellCommand {
            command: command.into(),
        }
    }

    pub fn open(uri: impl Into<String>) -> Self {
        Action::OpenTarget { uri: uri.into() }
    }

    pub fn app(name: impl Into<String>) -> Self {
        Action::LaunchApp { name: name.into() }
    }

    /// Selects an input source by its identifier pattern
    pub fn input_source(input_source_id: impl Into<String>) -> Self {
        Action::SelectInputSource(InputSourceSelector {
            input_source_id: Some(input_source_id.into()),
            ..Default::default()
        })
    }

    /// Selects an input source by its language pattern
    pub fn input_language(language: impl Into<String>) -> Self {
        Action::SelectInputSource(InputSourceSelector {
            language: Some(language.into()),
            ..Default::default()
        })
    }
}

/// Literal engine events bound to a key, for effects the action vocabulary
/// cannot express
#[derive(Clone, Debug, PartialEq)]
pub struct RawBinding {
    pub to: Vec<ToEvent>,
    pub description: Option<String>,
}

/// A node in the layer tree
#[derive(Clone, Debug, PartialEq)]
pub enum LayerNode {
    /// Leaf action
    Action(Action),
    /// Leaf with literal engine events
    Raw(RawBinding),
    /// Nested layer; the entry's key becomes a sub-leader
    Layer(LayerMapping),
    /// Nested layer defined once under a name and reused
    Reference(String),
}

impl From<Action> for LayerNode {
    fn from(action: Action) -> Self {
        LayerNode::Action(action)
    }
}

impl From<RawBinding> for LayerNode {
    fn from(raw: RawBinding) -> Self {
        LayerNode::Raw(raw)
    }
}

impl From<LayerMapping> for LayerNode {
    fn from(mapping: LayerMapping) -> Self {
        LayerNode::Layer(mapping)
    }
}

/// Ordered `key → node` entries of one layer
///
/// Keys are kept as authored; they are resolved against the key vocabulary
/// during compilation. Duplicate keys are representable so that the compiler
/// can reject them instead of silently keeping one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerMapping {
    entries: Vec<(String, LayerNode)>,
}

impl LayerMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, preserving insertion order
    pub fn bind(mut self, key: impl Into<String>, node: impl Into<LayerNode>) -> Self {
        self.insert(key, node);
        self
    }

    /// Appends an entry
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<LayerNode>) {
        self.entries.push((key.into(), node.into()));
    }

    /// Replaces the first entry with the same authored key, or appends
    pub fn replace_or_insert(&mut self, key: impl Into<String>, node: impl Into<LayerNode>) {
        let key = key.into();
        let node = node.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = node,
            None => self.entries.push((key, node)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LayerNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A complete layer specification
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerSpec {
    /// Root-level leaders (and root-level leaves)
    pub root: LayerMapping,

    /// Named layers, referenced from the tree with `LayerNode::Reference`
    pub definitions: HashMap<String, LayerMapping>,
}

impl LayerSpec {
    pub fn new(root: LayerMapping) -> Self {
        Self {
            root,
            definitions: HashMap::new(),
        }
    }

    pub fn with_definition(mut self, name: impl Into<String>, mapping: LayerMapping) -> Self {
        self.definitions.insert(name.into(), mapping);
        self
    }
}

/// Leader keys from the root down to one layer
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LeaderPath(Vec<KeyCode>);

impl LeaderPath {
    /// The empty path (the root mapping itself)
    pub fn root() -> Self {
        Self::default()
    }

    /// This path extended by one leader
    pub fn child(&self, key: KeyCode) -> Self {
        let mut keys = self.0.clone();
        keys.push(key);
        Self(keys)
    }

    pub fn keys(&self) -> &[KeyCode] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for LeaderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }

        let rendered = self
            .0
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(" > ");
        f.write_str(&rendered)
    }
}

/// A global engine variable flagging that one layer's leader is held
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateVariable {
    name: String,
}

impl StateVariable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `set_variable` event assigning `value`
    pub fn set(&self, value: i64) -> ToEvent {
        ToEvent::set_variable(&self.name, value)
    }

    /// Condition: the layer is held
    pub fn active(&self) -> Condition {
        Condition::variable_if(&self.name, 1)
    }

    /// Condition: the layer is not held
    pub fn inactive(&self) -> Condition {
        Condition::variable_if(&self.name, 0)
    }
}

impl fmt::Display for StateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> KeyCode {
        KeyCode::parse(name).unwrap()
    }

    #[test]
    fn test_key_chord_normalisation() {
        // Order and duplicates don't matter
        let chord1 = KeyChord::new(
            key("spacebar"),
            vec![Modifier::LeftCommand, Modifier::LeftControl, Modifier::LeftCommand],
        );
        let chord2 = KeyChord::new(key("space"), vec![Modifier::LeftControl, Modifier::LeftCommand]);

        assert_eq!(chord1, chord2);
        assert_eq!(chord1.to_string(), "left_control+left_command+spacebar");
    }

    #[test]
    fn test_mapping_preserves_insertion_order() {
        let mapping = LayerMapping::new()
            .bind("z", Action::app("Zed"))
            .bind("a", Action::app("Arc"))
            .bind("m", Action::app("Mail"));

        let keys = mapping.iter().map(|(k, _)| k).collect::<Vec<_>>();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_mapping_keeps_duplicates() {
        let mapping = LayerMapping::new()
            .bind("o", Action::app("A"))
            .bind("o", Action::app("B"));

        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_replace_or_insert() {
        let mut mapping = LayerMapping::new()
            .bind("a", Action::app("Arc"))
            .bind("b", Action::app("Books"));

        mapping.replace_or_insert("a", Action::app("Firefox"));
        mapping.replace_or_insert("c", Action::app("Calendar"));

        let entries = mapping.iter().collect::<Vec<_>>();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], ("a", &LayerNode::Action(Action::app("Firefox"))));
        assert_eq!(entries[2].0, "c");
    }

    #[test]
    fn test_leader_path_display() {
        let path = LeaderPath::root().child(key("i")).child(key("l"));
        assert_eq!(path.to_string(), "i > l");
        assert_eq!(path.depth(), 2);
        assert_eq!(LeaderPath::root().to_string(), "<root>");
    }

    #[test]
    fn test_state_variable_conditions() {
        let variable = StateVariable::new("hyper_sublayer_o");
        assert_eq!(variable.active(), Condition::variable_if("hyper_sublayer_o", 1));
        assert_eq!(variable.inactive(), Condition::variable_if("hyper_sublayer_o", 0));
        assert_eq!(variable.set(1), ToEvent::set_variable("hyper_sublayer_o", 1));
    }
}
