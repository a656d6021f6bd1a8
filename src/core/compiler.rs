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


//! src/core/compiler.rs
//!
//! Layer compiler
//!
//! Walks a `LayerSpec` and emits, for every leader key at every depth:
//! - one **activation** manipulator: pressing the leader sets its state
//!   variable to 1, releasing it sets it back to 0 (`to_after_key_up`, which
//!   the engine runs unconditionally), and tapping it alone still types the
//!   key (`to_if_alone`);
//! - one **dispatch** manipulator per leaf, gated by `variable_if(V, 1)` for
//!   every leader on the path, in path order.
//!
//! Sibling layers exclude each other: a leader's activation is also gated by
//! `variable_if(S, 0)` for each sibling layer `S`, so holding `o` and then
//! pressing `m` dispatches `o`'s binding for `m` instead of opening layer `m`.
//!
//! # Ordering
//! Within a layer's block the activation comes first, then nested sub-layers
//! (recursively), then the layer's own leaves. A sub-layer's dispatch for a
//! key therefore precedes a shallower dispatch for the same key, so the
//! engine's first-match rule always picks the most specific binding.

use std::collections::HashMap;
use tracing::debug;

use crate::core::allocator::{VariableAllocator, DEFAULT_PREFIX};
use crate::core::encoder::{describe, encode};
use crate::core::error::CompileError;
use crate::core::keys::KeyCode;
use crate::core::types::{Action, LayerMapping, LayerNode, LayerSpec, LeaderPath, RawBinding, StateVariable};
use crate::core::validator::{validate_action, validate_pattern, validate_raw_binding, validate_variable_name};
use crate::karabiner::{Condition, FromEvent, Manipulator, ToEvent};

/// Knobs that shape the compiled output
#[derive(Clone, Debug, PartialEq)]
pub struct CompileOptions {
    /// Prefix of every allocated state variable
    pub variable_prefix: String,

    /// Label used in rule and manipulator descriptions ("Hyper")
    pub label: String,

    /// Gates root-level activations and root-level leaves, typically
    /// `variable_if(hyper, 1)`
    pub root_conditions: Vec<Condition>,

    /// Appended to every manipulator, e.g. `frontmost_application_unless`
    pub context_conditions: Vec<Condition>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            variable_prefix: DEFAULT_PREFIX.to_string(),
            label: "Hyper".to_string(),
            root_conditions: Vec::new(),
            context_conditions: Vec::new(),
        }
    }
}

impl CompileOptions {
    /// Checks variable names and application patterns in the conditions
    pub fn validate(&self) -> Result<(), CompileError> {
        validate_variable_name(&self.variable_prefix)?;

        for condition in self.root_conditions.iter().chain(&self.context_conditions) {
            match condition {
                Condition::VariableIf { name, .. } | Condition::VariableUnless { name, .. } => {
                    validate_variable_name(name)?
                }
                Condition::FrontmostApplicationIf { bundle_identifiers }
                | Condition::FrontmostApplicationUnless { bundle_identifiers } => {
                    for pattern in bundle_identifiers {
                        validate_pattern(pattern)?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// What a root-level block holds
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockKind {
    /// A leader and everything beneath it
    Sublayer,
    /// A single leaf bound directly under the root
    Binding,
}

/// Manipulators compiled from one root-level entry
#[derive(Clone, Debug, PartialEq)]
pub struct LayerBlock {
    pub key: KeyCode,
    pub kind: BlockKind,
    pub manipulators: Vec<Manipulator>,
}

/// Result of compiling a specification
#[derive(Clone, Debug, PartialEq)]
pub struct Compilation {
    /// One block per root entry, in authored order
    pub blocks: Vec<LayerBlock>,

    /// Every state variable, in allocation order
    pub variables: Vec<(LeaderPath, StateVariable)>,
}

/// A child entry with its key resolved and references followed
struct Entry<'s> {
    key: KeyCode,
    authored: &'s str,
    node: Resolved<'s>,
}

enum Resolved<'s> {
    Action(&'s Action),
    Raw(&'s RawBinding),
    Layer {
        mapping: &'s LayerMapping,
        reference: Option<&'s str>,
    },
}

impl Resolved<'_> {
    fn is_layer(&self) -> bool {
        matches!(self, Resolved::Layer { .. })
    }
}

/// Recursive compiler over one specification
pub struct LayerCompiler<'a> {
    spec: &'a LayerSpec,
    options: &'a CompileOptions,
    allocator: VariableAllocator,
    /// Named definitions currently being expanded, outermost first
    expanding: Vec<&'a str>,
}

impl<'a> LayerCompiler<'a> {
    /// Prepares a compiler; fails if the options are unusable
    pub fn new(spec: &'a LayerSpec, options: &'a CompileOptions) -> Result<Self, CompileError> {
        options.validate()?;

        Ok(Self {
            spec,
            options,
            allocator: VariableAllocator::new(&options.variable_prefix)?,
            expanding: Vec::new(),
        })
    }

    /// Compiles the whole specification
    pub fn compile(mut self) -> Result<Compilation, CompileError> {
        let options = self.options;
        let spec = self.spec;
        let root = LeaderPath::root();
        let entries = self.resolve_entries(&root, &spec.root)?;

        let layer_variables = self.layer_variables(&root, &entries);
        let mut blocks = Vec::with_capacity(entries.len());

        for entry in &entries {
            let manipulators = match entry.node {
                Resolved::Layer { mapping, reference } => {
                    let path = root.child(entry.key);
                    let exclusions = sibling_exclusions(&layer_variables, entry.key);

                    let mut manipulators = Vec::new();
                    self.compile_layer(
                        &path,
                        mapping,
                        reference,
                        &options.root_conditions,
                        &[],
                        &exclusions,
                        &mut manipulators,
                    )?;
                    manipulators
                }
                _ => {
                    // Root leaves are gated by the root context and fire only
                    // while no root layer is held
                    let mut conditions = options.root_conditions.clone();
                    conditions.extend(layer_variables.iter().map(|(_, v)| v.inactive()));
                    conditions.extend(options.context_conditions.iter().cloned());

                    vec![self.dispatch(&root, entry, conditions)?]
                }
            };

            let kind = if entry.node.is_layer() {
                BlockKind::Sublayer
            } else {
                BlockKind::Binding
            };

            blocks.push(LayerBlock {
                key: entry.key,
                kind,
                manipulators,
            });
        }

        Ok(Compilation {
            blocks,
            variables: self.allocator.allocated().to_vec(),
        })
    }

    /// Compiles one layer and everything beneath it into `out`
    ///
    /// * `activation_gate` - conditions inherited by this layer's activation
    /// * `path_gate` - `variable_if(Vi, 1)` for every ancestor leader
    /// * `exclusions` - `variable_if(S, 0)` for every sibling layer
    #[allow(clippy::too_many_arguments)]
    fn compile_layer(
        &mut self,
        path: &LeaderPath,
        mapping: &'a LayerMapping,
        reference: Option<&'a str>,
        activation_gate: &[Condition],
        path_gate: &[Condition],
        exclusions: &[Condition],
        out: &mut Vec<Manipulator>,
    ) -> Result<(), CompileError> {
        if let Some(name) = reference {
            if let Some(start) = self.expanding.iter().position(|n| *n == name) {
                let mut chain = self.expanding[start..]
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>();
                chain.push(name.to_string());
                return Err(CompileError::CyclicReference(chain));
            }
            self.expanding.push(name);
        }

        if mapping.is_empty() {
            return Err(CompileError::EmptyLayer(path.to_string()));
        }

        let options = self.options;
        let key = match path.keys().last() {
            Some(key) => *key,
            None => return Err(CompileError::EmptyLayer(path.to_string())),
        };
        let variable = self.allocator.allocate(path);

        // Activation: hold to enter, release to leave, tap to type the key
        let mut activation = Manipulator::basic(FromEvent::any_modifiers(key));
        activation.description = Some(format!("Toggle {} sublayer {}", options.label, path));
        activation.to = vec![variable.set(1)];
        activation.to_after_key_up = vec![variable.set(0)];
        activation.to_if_alone = vec![ToEvent::key(key)];
        activation.conditions = activation_gate
            .iter()
            .chain(exclusions)
            .chain(&options.context_conditions)
            .cloned()
            .collect();
        out.push(activation);

        let entries = self.resolve_entries(path, mapping)?;
        let mut child_gate = path_gate.to_vec();
        child_gate.push(variable.active());

        // Nested layers first, so their dispatches win over this layer's
        let nested_variables = self.layer_variables(path, &entries);
        for entry in entries.iter().filter(|e| e.node.is_layer()) {
            if let Resolved::Layer { mapping, reference } = entry.node {
                let exclusions = sibling_exclusions(&nested_variables, entry.key);
                self.compile_layer(
                    &path.child(entry.key),
                    mapping,
                    reference,
                    &child_gate,
                    &child_gate,
                    &exclusions,
                    out,
                )?;
            }
        }

        for entry in entries.iter().filter(|e| !e.node.is_layer()) {
            let mut conditions = child_gate.clone();
            conditions.extend(options.context_conditions.iter().cloned());
            out.push(self.dispatch(path, entry, conditions)?);
        }

        debug!(
            path = %path,
            variable = %variable,
            bindings = entries.len(),
            "compiled layer"
        );

        if reference.is_some() {
            self.expanding.pop();
        }

        Ok(())
    }

    /// Builds the dispatch manipulator for a leaf entry
    fn dispatch(
        &self,
        path: &LeaderPath,
        entry: &Entry<'a>,
        conditions: Vec<Condition>,
    ) -> Result<Manipulator, CompileError> {
        let invalid = |source| CompileError::InvalidBinding {
            key: entry.authored.to_string(),
            path: path.to_string(),
            source,
        };

        let mut manipulator = Manipulator::basic(FromEvent::any_modifiers(entry.key));

        match entry.node {
            Resolved::Action(action) => {
                validate_action(action).map_err(invalid)?;
                manipulator.description = Some(describe(action));
                manipulator.to = encode(action);
            }
            Resolved::Raw(raw) => {
                validate_raw_binding(raw).map_err(invalid)?;
                manipulator.description = raw.description.clone();
                manipulator.to = raw.to.clone();
            }
            Resolved::Layer { .. } => {
                return Err(CompileError::EmptyLayer(path.child(entry.key).to_string()))
            }
        }

        manipulator.conditions = conditions;
        Ok(manipulator)
    }

    /// Resolves keys, rejects duplicates, follows references
    fn resolve_entries(
        &mut self,
        path: &LeaderPath,
        mapping: &'a LayerMapping,
    ) -> Result<Vec<Entry<'a>>, CompileError> {
        let spec = self.spec;
        let definitions: &'a HashMap<String, LayerMapping> = &spec.definitions;
        let mut entries = Vec::with_capacity(mapping.len());

        for (authored, node) in mapping.iter() {
            let key = KeyCode::parse(authored).map_err(|e| CompileError::unknown_key(e, path))?;
            self.allocator.claim(path, key, authored)?;

            let node = match node {
                LayerNode::Action(action) => Resolved::Action(action),
                LayerNode::Raw(raw) => Resolved::Raw(raw),
                LayerNode::Layer(mapping) => Resolved::Layer {
                    mapping,
                    reference: None,
                },
                LayerNode::Reference(name) => match definitions.get_key_value(name) {
                    Some((name, mapping)) => Resolved::Layer {
                        mapping,
                        reference: Some(name.as_str()),
                    },
                    None => {
                        return Err(CompileError::UnknownLayerReference {
                            name: name.clone(),
                            path: path.child(key).to_string(),
                        })
                    }
                },
            };

            entries.push(Entry {
                key,
                authored,
                node,
            });
        }

        Ok(entries)
    }

    /// Variables of the layer entries directly under `path`
    fn layer_variables(
        &mut self,
        path: &LeaderPath,
        entries: &[Entry<'a>],
    ) -> Vec<(KeyCode, StateVariable)> {
        entries
            .iter()
            .filter(|e| e.node.is_layer())
            .map(|e| (e.key, self.allocator.allocate(&path.child(e.key))))
            .collect()
    }
}

/// `variable_if(S, 0)` for every sibling layer other than `key`
fn sibling_exclusions(siblings: &[(KeyCode, StateVariable)], key: KeyCode) -> Vec<Condition> {
    siblings
        .iter()
        .filter(|(sibling, _)| *sibling != key)
        .map(|(_, variable)| variable.inactive())
        .collect()
}
