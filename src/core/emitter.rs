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


//! src/core/emitter.rs
//!
//! Rule emitter
//!
//! Groups compiled blocks into named rules. Purely organisational: the
//! manipulators are passed through untouched and in order.

use tracing::debug;

use crate::core::compiler::{BlockKind, LayerBlock};
use crate::core::keys::{modifier_group, KeyCode, Modifier};
use crate::core::types::StateVariable;
use crate::karabiner::{FromEvent, Manipulator, Rule, ToEvent};

/// The key that gates every root-level leader while held
#[derive(Clone, Debug, PartialEq)]
pub struct HyperKey {
    pub key: KeyCode,

    /// Variable set to 1 while the key is held
    pub variable: String,

    /// Variables forced back to 0 whenever the key goes down
    pub reset: Vec<String>,
}

impl HyperKey {
    pub fn new(key: KeyCode, variable: impl Into<String>) -> Self {
        Self {
            key,
            variable: variable.into(),
            reset: Vec::new(),
        }
    }

    /// The gate placed on root-level activations
    pub fn state(&self) -> StateVariable {
        StateVariable::new(self.variable.clone())
    }
}

/// Names rules after their root entry
pub struct RuleEmitter {
    label: String,
}

impl RuleEmitter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// One rule per block, in block order
    pub fn emit(&self, blocks: Vec<LayerBlock>) -> Vec<Rule> {
        let rules = blocks
            .into_iter()
            .map(|block| Rule {
                description: self.describe(&block),
                manipulators: block.manipulators,
            })
            .collect::<Vec<_>>();

        debug!(rules = rules.len(), "emitted layer rules");
        rules
    }

    fn describe(&self, block: &LayerBlock) -> String {
        match block.kind {
            BlockKind::Sublayer => format!("{} Key sublayer \"{}\"", self.label, block.key),
            BlockKind::Binding => format!("{} Key + {}", self.label, block.key),
        }
    }

    /// A label naming a modifier group (`Hyper`, `Meh`) carries its glyphs
    fn hyper_title(&self) -> String {
        match modifier_group(&self.label) {
            Some(modifiers) => {
                let glyphs = modifiers.iter().filter_map(|m| glyph(*m)).collect::<String>();
                format!("{} Key ({})", self.label, glyphs)
            }
            None => format!("{} Key", self.label),
        }
    }

    /// The Hyper key definition itself
    ///
    /// Pressing the key sets its variable and clears every reset variable;
    /// releasing it clears the variable; tapping it alone types the key.
    pub fn hyper_rule(&self, hyper: &HyperKey) -> Rule {
        let state = hyper.state();

        let mut manipulator = Manipulator::basic(FromEvent::any_modifiers(hyper.key));
        manipulator.description = Some(format!("{} key -> {} Key", hyper.key, self.label));
        manipulator.to = std::iter::once(state.set(1))
            .chain(hyper.reset.iter().map(|name| ToEvent::set_variable(name, 0)))
            .collect();
        manipulator.to_after_key_up = vec![state.set(0)];
        manipulator.to_if_alone = vec![ToEvent::key(hyper.key)];

        Rule {
            description: self.hyper_title(),
            manipulators: vec![manipulator],
        }
    }
}

fn glyph(modifier: Modifier) -> Option<char> {
    match modifier {
        Modifier::LeftControl | Modifier::RightControl | Modifier::Control => Some('⌃'),
        Modifier::LeftOption | Modifier::RightOption | Modifier::Option => Some('⌥'),
        Modifier::LeftShift | Modifier::RightShift | Modifier::Shift => Some('⇧'),
        Modifier::LeftCommand | Modifier::RightCommand | Modifier::Command => Some('⌘'),
        Modifier::Fn | Modifier::CapsLock | Modifier::Any => None,
    }
}
