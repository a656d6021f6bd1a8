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
use crate::core::CompileError;
use crate::karabiner::Document;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

const LAYERS: &str = r#"
[layers.o]
c = "app:Google Chrome"
"#;

/// Same leader written twice under two names for one physical key
const DUPLICATE_LEADER: &str = r#"
[layers.space]
c = "app:Google Chrome"

[layers.spacebar]
s = "app:Safari"
"#;

const NEVER_RESET: &str = r#"
[[rules]]
description = "Sticky"

[[rules.manipulators]]
type = "basic"
from = { key_code = "v" }
to = [{ set_variable = { name = "sticky", value = 1 } }]

[layers.o]
c = "app:Google Chrome"
"#;

/// Helper: Writes `content` as the spec file and returns (dir, spec, output)
fn setup(content: &str) -> (TempDir, PathBuf, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let spec_path = temp_dir.path().join("hyper.toml");
    fs::write(&spec_path, content).unwrap();
    let output_path = temp_dir.path().join("karabiner").join("karabiner.json");
    (temp_dir, spec_path, output_path)
}

#[test]
fn test_build_writes_document() {
    let (_temp_dir, spec_path, output_path) = setup(LAYERS);

    let summary = build(&spec_path, Some(&output_path), false).unwrap();

    assert_eq!(summary.output_path, output_path);
    assert_eq!(summary.profiles, 1);
    assert_eq!(summary.rules, 1);
    assert!(summary.backup_path.is_none(), "Nothing to back up on first build");

    let written = Document::from_json(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(written.profiles[0].complex_modifications.rules.len(), 1);
}

#[test]
fn test_rebuild_backs_up_previous_output() {
    let (_temp_dir, spec_path, output_path) = setup(LAYERS);
    build(&spec_path, Some(&output_path), false).unwrap();
    let first = fs::read_to_string(&output_path).unwrap();

    let summary = build(&spec_path, Some(&output_path), false).unwrap();

    let backup = summary.backup_path.unwrap();
    assert_eq!(fs::read_to_string(backup).unwrap(), first);
}

#[test]
fn test_no_backup_skips_backup() {
    let (_temp_dir, spec_path, output_path) = setup(LAYERS);
    build(&spec_path, Some(&output_path), false).unwrap();

    let summary = build(&spec_path, Some(&output_path), true).unwrap();

    assert!(summary.backup_path.is_none());
}

#[test]
fn test_compile_error_writes_nothing() {
    let (_temp_dir, spec_path, output_path) = setup(DUPLICATE_LEADER);

    let result = build(&spec_path, Some(&output_path), false);

    assert!(matches!(
        result,
        Err(ConfigError::Compile(CompileError::DuplicateLeaderKey { .. }))
    ));
    assert!(!output_path.exists());
}

#[test]
fn test_compile_error_leaves_existing_output_untouched() {
    let (_temp_dir, spec_path, output_path) = setup(DUPLICATE_LEADER);
    fs::create_dir_all(output_path.parent().unwrap()).unwrap();
    let original = "{\n  \"profiles\": [{ \"name\": \"Mine\" }]\n}\n";
    fs::write(&output_path, original).unwrap();

    assert!(build(&spec_path, Some(&output_path), false).is_err());

    assert_eq!(fs::read_to_string(&output_path).unwrap(), original);
}

#[test]
fn test_validation_error_leaves_existing_output_untouched() {
    let (_temp_dir, spec_path, output_path) = setup(NEVER_RESET);
    fs::create_dir_all(output_path.parent().unwrap()).unwrap();
    let original = "{}\n";
    fs::write(&output_path, original).unwrap();

    let result = build(&spec_path, Some(&output_path), false);

    assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
    assert_eq!(fs::read_to_string(&output_path).unwrap(), original);
}

#[test]
fn test_missing_spec() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("karabiner.json");

    let result = build(&temp_dir.path().join("missing.toml"), Some(&output_path), false);

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
    assert!(!output_path.exists());
}
