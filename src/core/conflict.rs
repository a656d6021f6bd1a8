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


//! Manipulator conflict detection
//!
//! Two manipulators conflict when they listen for the same `from` event
//! under the same set of conditions: the engine would only ever fire the
//! first one. Condition order is irrelevant, so conditions are sorted
//! before indexing.
//!
//! # Performance
//! - Add manipulator: O(c log c) for c conditions
//! - Check conflict: O(1) average case
//! - List all conflicts: O(n) where n = number of unique triggers

use std::collections::HashMap;

use crate::karabiner::{Condition, FromEvent, Manipulator, Rule};

/// A `from` event plus its normalized condition set
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Trigger {
    pub from: FromEvent,
    pub conditions: Vec<Condition>,
}

impl Trigger {
    pub fn of(manipulator: &Manipulator) -> Self {
        let mut conditions = manipulator.conditions.clone();
        conditions.sort();
        conditions.dedup();

        Self {
            from: manipulator.from.clone(),
            conditions,
        }
    }
}

/// A manipulator together with the rule it came from
#[derive(Clone, Debug, PartialEq)]
pub struct Located {
    pub rule: String,
    pub manipulator: Manipulator,
}

/// Detects manipulators that can never fire because another one shadows them.
pub struct ConflictDetector {
    /// Maps each trigger to every manipulator using it.
    manipulators: HashMap<Trigger, Vec<Located>>,
}

/// Two or more manipulators sharing one trigger
#[derive(Clone, Debug, PartialEq)]
pub struct Conflict {
    pub trigger: Trigger,

    /// Always 2 or more, in insertion order
    pub manipulators: Vec<Located>,
}

impl ConflictDetector {
    pub fn new() -> Self {
        Self {
            manipulators: HashMap::new(),
        }
    }

    /// Indexes every manipulator of every rule
    pub fn from_rules<'r>(rules: impl IntoIterator<Item = &'r Rule>) -> Self {
        let mut detector = Self::new();
        for rule in rules {
            for manipulator in &rule.manipulators {
                detector.add_manipulator(&rule.description, manipulator.clone());
            }
        }
        detector
    }

    pub fn add_manipulator(&mut self, rule: &str, manipulator: Manipulator) {
        self.manipulators
            .entry(Trigger::of(&manipulator))
            .or_default()
            .push(Located {
                rule: rule.to_string(),
                manipulator,
            });
    }

    /// Finds all triggers with 2 or more manipulators.
    ///
    /// Sorted by key code so reports are stable.
    pub fn find_conflicts(&self) -> Vec<Conflict> {
        let mut conflicts = self
            .manipulators
            .iter()
            .filter(|(_, located)| located.len() > 1)
            .map(|(trigger, located)| Conflict {
                trigger: trigger.clone(),
                manipulators: located.clone(),
            })
            .collect::<Vec<_>>();

        conflicts.sort_by(|a, b| {
            a.trigger
                .from
                .key_code
                .cmp(&b.trigger.from.key_code)
                .then_with(|| a.trigger.conditions.cmp(&b.trigger.conditions))
        });
        conflicts
    }

    pub fn has_conflict(&self, trigger: &Trigger) -> bool {
        self.manipulators
            .get(trigger)
            .map(|located| located.len() > 1)
            .unwrap_or(false)
    }

    /// Returns the total number of manipulators tracked.
    pub fn total_manipulators(&self) -> usize {
        self.manipulators.values().map(|v| v.len()).sum()
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new()
    }
}
