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


use super::super::*;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

use crate::karabiner::{
    ComplexModifications, Condition, Document, FromEvent, Manipulator, Profile, Rule, ToEvent,
};
use crate::core::KeyCode;

fn setup(initial: Option<&str>) -> (TempDir, PathBuf, ConfigManager) {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("karabiner.json");
    if let Some(content) = initial {
        fs::write(&output_path, content).unwrap();
    }
    let manager = ConfigManager::new(output_path.clone()).unwrap();
    (temp_dir, output_path, manager)
}

fn document(manipulators: Vec<Manipulator>) -> Document {
    Document {
        global: Default::default(),
        profiles: vec![Profile {
            name: "Default".to_string(),
            selected: Some(true),
            complex_modifications: ComplexModifications {
                rules: vec![Rule {
                    description: "Test".to_string(),
                    manipulators,
                }],
            },
        }],
    }
}

fn activation(key: &str, variable: &str, reset: bool) -> Manipulator {
    let mut m = Manipulator::basic(FromEvent::any_modifiers(KeyCode::parse(key).unwrap()));
    m.to = vec![ToEvent::set_variable(variable, 1)];
    if reset {
        m.to_after_key_up = vec![ToEvent::set_variable(variable, 0)];
    }
    m
}

#[test]
fn test_begin_creates_backup_of_existing_output() {
    let (_temp_dir, _output_path, manager) = setup(Some("old\n"));

    let tx = ConfigTransaction::begin(&manager).unwrap();

    let backup = tx.backup_path().unwrap();
    assert!(backup.exists());
    assert_eq!(fs::read_to_string(backup).unwrap(), "old\n");
}

#[test]
fn test_begin_without_existing_output_takes_no_backup() {
    let (_temp_dir, _output_path, manager) = setup(None);

    let tx = ConfigTransaction::begin(&manager).unwrap();

    assert!(tx.backup_path().is_none());
    assert!(manager.list_backups().unwrap().is_empty());
}

#[test]
fn test_commit_writes_content() {
    let (_temp_dir, output_path, manager) = setup(Some("old\n"));

    let mut tx = ConfigTransaction::begin(&manager).unwrap();
    tx.commit("new\n").unwrap();

    assert_eq!(fs::read_to_string(&output_path).unwrap(), "new\n");
}

#[test]
fn test_double_commit_rejected() {
    let (_temp_dir, output_path, manager) = setup(None);

    let mut tx = ConfigTransaction::begin(&manager).unwrap();
    tx.commit("first\n").unwrap();

    assert!(matches!(tx.commit("second\n"), Err(ConfigError::AlreadyCommitted)));
    assert_eq!(fs::read_to_string(&output_path).unwrap(), "first\n");
}

#[test]
fn test_rollback_restores_backup() {
    let (_temp_dir, output_path, manager) = setup(Some("old\n"));

    let mut tx = ConfigTransaction::begin(&manager).unwrap();
    tx.commit("new\n").unwrap();
    tx.rollback().unwrap();

    assert_eq!(fs::read_to_string(&output_path).unwrap(), "old\n");
}

#[test]
fn test_rollback_removes_file_that_did_not_exist() {
    let (_temp_dir, output_path, manager) = setup(None);

    let mut tx = ConfigTransaction::begin(&manager).unwrap();
    tx.commit("new\n").unwrap();
    assert!(output_path.exists());

    tx.rollback().unwrap();
    assert!(!output_path.exists());
}

#[test]
fn test_rollback_without_backup_of_existing_file_fails() {
    let (_temp_dir, output_path, manager) = setup(Some("old\n"));

    let mut tx = ConfigTransaction::begin_without_backup(&manager);
    tx.commit("new\n").unwrap();

    assert!(matches!(tx.rollback(), Err(ConfigError::BackupFailed(_))));
    assert_eq!(fs::read_to_string(&output_path).unwrap(), "new\n");
}

#[test]
fn test_commit_with_validation_writes_pretty_json() {
    let (_temp_dir, output_path, manager) = setup(None);
    let document = document(vec![activation("o", "hyper_sublayer_o", true)]);

    let mut tx = ConfigTransaction::begin(&manager).unwrap();
    tx.commit_with_validation(&document).unwrap();

    let written = fs::read_to_string(&output_path).unwrap();
    assert!(written.starts_with("{\n  \"global\""));
    assert!(written.ends_with("}\n"));
    assert_eq!(Document::from_json(&written).unwrap(), document);
}

#[test]
fn test_commit_with_validation_blocks_errors() {
    let (_temp_dir, output_path, manager) = setup(Some("old\n"));
    let document = document(vec![activation("o", "hyper_sublayer_o", false)]);

    let mut tx = ConfigTransaction::begin(&manager).unwrap();
    let result = tx.commit_with_validation(&document);

    assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
    assert_eq!(fs::read_to_string(&output_path).unwrap(), "old\n");
}

#[test]
fn test_commit_with_validation_allows_warnings() {
    let (_temp_dir, output_path, manager) = setup(None);
    let mut gated = activation("o", "hyper_sublayer_o", true);
    gated.conditions = vec![Condition::variable_if("hyper", 1)];

    let mut document = document(vec![gated]);
    document.profiles[0].complex_modifications.rules.push(Rule {
        description: "Empty".to_string(),
        manipulators: vec![],
    });

    let mut tx = ConfigTransaction::begin(&manager).unwrap();
    tx.commit_with_validation(&document).unwrap();

    assert!(output_path.exists());
}
