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


//! State variable allocation
//!
//! Every leader key, at every depth, gets its own engine variable. The name
//! is a pure function of the leader path:
//!
//! ```text
//! [o]      → hyper_sublayer_o
//! [i, l]   → hyper_sublayer_i__l
//! ```
//!
//! Key names never contain `__` and never start or end with `_`, so joining
//! path segments with `__` is injective: different paths always produce
//! different names, and recompiling an unchanged specification always
//! produces the same names. There is no counter involved.

use std::collections::HashMap;
use tracing::trace;

use crate::core::error::CompileError;
use crate::core::keys::KeyCode;
use crate::core::types::{LeaderPath, StateVariable};
use crate::core::validator::{validate_variable_name, ValidationError};

/// Default variable prefix
pub const DEFAULT_PREFIX: &str = "hyper_sublayer";

/// Derives the variable name for a leader path
pub fn variable_name(prefix: &str, path: &LeaderPath) -> String {
    let segments = path
        .keys()
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join("__");

    format!("{}_{}", prefix, segments)
}

/// Assigns state variables to leader paths and rejects ambiguous siblings.
pub struct VariableAllocator {
    prefix: String,
    /// Keys claimed directly under each parent, with their authored spelling
    claimed: HashMap<LeaderPath, HashMap<KeyCode, String>>,
    assigned: HashMap<LeaderPath, StateVariable>,
    /// Allocation order, for reporting
    order: Vec<(LeaderPath, StateVariable)>,
}

impl VariableAllocator {
    /// Creates an allocator for the given name prefix.
    pub fn new(prefix: &str) -> Result<Self, ValidationError> {
        validate_variable_name(prefix)?;

        Ok(Self {
            prefix: prefix.to_string(),
            claimed: HashMap::new(),
            assigned: HashMap::new(),
            order: Vec::new(),
        })
    }

    /// Registers `key` as a direct child of `parent`.
    ///
    /// Fails with `DuplicateLeaderKey` when the parent already has a child
    /// on the same physical key, even if it was spelled differently
    /// (`space` and `spacebar`).
    pub fn claim(
        &mut self,
        parent: &LeaderPath,
        key: KeyCode,
        authored: &str,
    ) -> Result<(), CompileError> {
        let siblings = self.claimed.entry(parent.clone()).or_default();

        if let Some(first) = siblings.get(&key) {
            return Err(CompileError::DuplicateLeaderKey {
                key: authored.to_string(),
                first: first.clone(),
                path: parent.to_string(),
            });
        }

        siblings.insert(key, authored.to_string());
        Ok(())
    }

    /// Returns the variable for `path`, allocating it on first use.
    ///
    /// Equal paths always yield the same variable.
    pub fn allocate(&mut self, path: &LeaderPath) -> StateVariable {
        if let Some(existing) = self.assigned.get(path) {
            return existing.clone();
        }

        let variable = StateVariable::new(variable_name(&self.prefix, path));
        trace!(path = %path, variable = %variable, "allocated state variable");

        self.assigned.insert(path.clone(), variable.clone());
        self.order.push((path.clone(), variable.clone()));
        variable
    }

    /// Every allocated variable in allocation order
    pub fn allocated(&self) -> &[(LeaderPath, StateVariable)] {
        &self.order
    }
}
