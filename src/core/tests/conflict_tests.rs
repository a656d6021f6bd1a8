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


//! Conflict detector tests
//!
//! Manipulators conflict when they share a `from` event and an identical
//! condition set (in any order).

use crate::core::{compile, conflict::*, Action, CompileOptions, KeyCode, LayerMapping, LayerSpec};
use crate::karabiner::{Condition, FromEvent, Manipulator, Rule};

/// Helper to create test manipulators
fn manipulator(key: &str, conditions: &[(&str, i64)]) -> Manipulator {
    let mut m = Manipulator::basic(FromEvent::any_modifiers(KeyCode::parse(key).unwrap()));
    m.conditions = conditions
        .iter()
        .map(|(name, value)| Condition::variable_if(name, *value))
        .collect();
    m
}

#[test]
fn test_no_conflicts_when_empty() {
    let detector = ConflictDetector::new();
    assert_eq!(detector.find_conflicts().len(), 0);
    assert_eq!(detector.total_manipulators(), 0);
}

#[test]
fn test_different_conditions_do_not_conflict() {
    let mut detector = ConflictDetector::new();

    detector.add_manipulator("o", manipulator("c", &[("layer_o", 1)]));
    detector.add_manipulator("b", manipulator("c", &[("layer_b", 1)]));
    detector.add_manipulator("o", manipulator("s", &[("layer_o", 1)]));

    assert_eq!(detector.find_conflicts().len(), 0);
    assert_eq!(detector.total_manipulators(), 3);
}

#[test]
fn test_detects_simple_conflict() {
    let mut detector = ConflictDetector::new();

    detector.add_manipulator("first", manipulator("c", &[("layer_o", 1)]));
    detector.add_manipulator("second", manipulator("c", &[("layer_o", 1)]));

    let conflicts = detector.find_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].manipulators.len(), 2);
    assert_eq!(conflicts[0].manipulators[0].rule, "first");
    assert_eq!(conflicts[0].manipulators[1].rule, "second");
    assert_eq!(conflicts[0].trigger.from.key_code, KeyCode::parse("c").unwrap());
}

#[test]
fn test_condition_order_independence() {
    let mut detector = ConflictDetector::new();

    let a = manipulator("1", &[("layer_i", 1), ("layer_i__l", 1)]);
    let b = manipulator("1", &[("layer_i__l", 1), ("layer_i", 1)]);
    let trigger = Trigger::of(&a);

    detector.add_manipulator("i", a);
    assert!(!detector.has_conflict(&trigger));

    detector.add_manipulator("i", b);
    assert!(detector.has_conflict(&trigger));
}

#[test]
fn test_conflicts_sorted_by_key() {
    let mut detector = ConflictDetector::new();

    for _ in 0..2 {
        detector.add_manipulator("r", manipulator("z", &[]));
        detector.add_manipulator("r", manipulator("a", &[]));
    }

    let keys = detector
        .find_conflicts()
        .iter()
        .map(|c| c.trigger.from.key_code.name())
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["a", "z"]);
}

#[test]
fn test_compiled_output_has_no_conflicts() {
    let spec = LayerSpec::new(
        LayerMapping::new()
            .bind("o", LayerMapping::new().bind("m", Action::app("Mail")))
            .bind("m", LayerMapping::new().bind("o", Action::app("Obsidian")))
            .bind(
                "i",
                LayerMapping::new()
                    .bind("1", Action::app("One"))
                    .bind("l", LayerMapping::new().bind("1", Action::app("Two"))),
            ),
    );
    let rules = compile(&spec, &CompileOptions::default()).unwrap();

    let detector = ConflictDetector::from_rules(&rules);
    assert!(detector.find_conflicts().is_empty());
    assert_eq!(detector.total_manipulators(), 8);
}

#[test]
fn test_from_rules_keeps_rule_names() {
    let rules = vec![
        Rule {
            description: "Caps Lock".to_string(),
            manipulators: vec![manipulator("caps_lock", &[])],
        },
        Rule {
            description: "Caps Lock again".to_string(),
            manipulators: vec![manipulator("caps_lock", &[])],
        },
    ];

    let conflicts = ConflictDetector::from_rules(&rules).find_conflicts();
    assert_eq!(conflicts.len(), 1);

    let names = conflicts[0]
        .manipulators
        .iter()
        .map(|l| l.rule.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Caps Lock", "Caps Lock again"]);
}
