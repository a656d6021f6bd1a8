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


use super::super::spec_file::*;
use super::super::ConfigError;
use std::path::{Path, PathBuf};

use crate::core::{Action, CompileError, LayerNode};
use crate::karabiner::{Condition, ToEvent};

const DEMO: &str = include_str!("../../../demos/hyper.toml");

#[test]
fn test_minimal_spec_builds_default_profile() {
    let spec = SpecFile::parse(
        r#"
        [layers.o]
        c = "app:Google Chrome"
        "#,
    )
    .unwrap();

    let document = spec.build_document().unwrap();

    assert_eq!(document.profiles.len(), 1);
    assert_eq!(document.profiles[0].name, "Default");
    assert_eq!(document.profiles[0].selected, Some(true));

    let rules = &document.profiles[0].complex_modifications.rules;
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].description, "Hyper Key sublayer \"o\"");
    assert_eq!(rules[0].manipulators.len(), 2);
}

#[test]
fn test_layers_keep_file_order() {
    let spec = SpecFile::parse(
        r#"
        [layers.z]
        a = "app:Arc"
        [layers.a]
        z = "app:Zed"
        [layers.m]
        m = "app:Mail"
        "#,
    )
    .unwrap();

    let document = spec.build_document().unwrap();
    let descriptions = document.profiles[0]
        .complex_modifications
        .rules
        .iter()
        .map(|r| r.description.as_str())
        .collect::<Vec<_>>();

    assert_eq!(
        descriptions,
        vec![
            "Hyper Key sublayer \"z\"",
            "Hyper Key sublayer \"a\"",
            "Hyper Key sublayer \"m\"",
        ]
    );
}

#[test]
fn test_hyper_section_adds_rule_and_root_gate() {
    let spec = SpecFile::parse(
        r#"
        [hyper]
        key = "space"
        reset = ["vim_mode"]

        [layers.o]
        c = "app:Google Chrome"
        "#,
    )
    .unwrap();

    let options = spec.compile_options().unwrap();
    assert_eq!(options.root_conditions, vec![Condition::variable_if("hyper", 1)]);

    let document = spec.build_document().unwrap();
    let rules = &document.profiles[0].complex_modifications.rules;

    assert_eq!(rules[0].description, "Hyper Key (⌃⌥⇧⌘)");
    let hyper = &rules[0].manipulators[0];
    assert_eq!(hyper.from.key_code.name(), "spacebar");
    assert_eq!(hyper.sets_in_to(0).collect::<Vec<_>>(), vec!["vim_mode"]);

    assert_eq!(
        rules[1].manipulators[0].conditions,
        vec![Condition::variable_if("hyper", 1)]
    );
}

#[test]
fn test_hyper_variable_collision_rejected() {
    let spec = SpecFile::parse(
        r#"
        [hyper]
        key = "spacebar"
        variable = "hyper_sublayer_o"
        "#,
    )
    .unwrap();

    assert!(matches!(spec.compile_options(), Err(ConfigError::InvalidSpec(_))));
}

#[test]
fn test_hyper_key_as_root_leader_rejected() {
    let spec = SpecFile::parse(
        r#"
        [hyper]
        key = "spacebar"

        [layers.space]
        c = "app:Google Chrome"
        "#,
    )
    .unwrap();

    match spec.build_document() {
        Err(ConfigError::InvalidSpec(message)) => assert!(message.contains("layers.space")),
        other => panic!("Expected InvalidSpec, got {:?}", other),
    }
}

#[test]
fn test_hyper_key_as_root_leaf_in_profile_rejected() {
    let spec = SpecFile::parse(
        r#"
        [hyper]
        key = "caps_lock"

        [layers.o]
        c = "app:Google Chrome"

        [[profiles]]
        name = "Laptop"
        [profiles.layers]
        caps_lock = "key:escape"
        "#,
    )
    .unwrap();

    assert!(matches!(spec.build_document(), Err(ConfigError::InvalidSpec(_))));
}

#[test]
fn test_unknown_hyper_key() {
    let spec = SpecFile::parse("[hyper]\nkey = \"hyperdrive\"\n").unwrap();
    assert!(matches!(spec.build_document(), Err(ConfigError::Key(_))));
}

#[test]
fn test_compile_section() {
    let spec = SpecFile::parse(
        r#"
        [compile]
        variable_prefix = "layer"
        label = "Caps"
        exclude_apps = ['^net\.kovidgoyal\.kitty$']

        [layers.o]
        c = "app:Google Chrome"
        "#,
    )
    .unwrap();

    let document = spec.build_document().unwrap();
    let rule = &document.profiles[0].complex_modifications.rules[0];

    assert_eq!(rule.description, "Caps Key sublayer \"o\"");
    assert_eq!(rule.manipulators[0].to, vec![ToEvent::set_variable("layer_o", 1)]);
    assert_eq!(
        rule.manipulators[1].conditions,
        vec![
            Condition::variable_if("layer_o", 1),
            Condition::FrontmostApplicationUnless {
                bundle_identifiers: vec!["^net\\.kovidgoyal\\.kitty$".to_string()],
            },
        ]
    );
}

#[test]
fn test_raw_binding_table() {
    let spec = SpecFile::parse(
        r#"
        [layers.w]
        open_bracket = { to = [{ key_code = "grave_accent_and_tilde", modifiers = ["left_shift", "left_command"] }] }
        "#,
    )
    .unwrap();

    let layer_spec = spec.layer_spec(&spec.profiles()[0]).unwrap();
    let (_, w) = layer_spec.root.iter().next().unwrap();

    let LayerNode::Layer(mapping) = w else {
        panic!("Expected a layer, got {:?}", w);
    };
    let (key, node) = mapping.iter().next().unwrap();
    assert_eq!(key, "open_bracket");
    assert!(matches!(node, LayerNode::Raw(raw) if raw.to.len() == 1 && raw.description.is_none()));
}

#[test]
fn test_raw_binding_emitted_as_given() {
    let spec = SpecFile::parse(
        r#"
        [layers.w]
        x = { to = [{ set_variable = { name = "foo", value = 1, key_up_value = 0 } }, { shell_command = "ls", extra_opt = true }] }
        "#,
    )
    .unwrap();

    let document = spec.build_document().unwrap();
    let dispatch = &document.profiles[0].complex_modifications.rules[0].manipulators[1];

    assert_eq!(
        serde_json::to_value(&dispatch.to).unwrap(),
        serde_json::json!([
            { "set_variable": { "name": "foo", "value": 1, "key_up_value": 0 } },
            { "shell_command": "ls", "extra_opt": true }
        ])
    );
}

#[test]
fn test_raw_binding_unexpected_field() {
    let spec = SpecFile::parse(
        r#"
        [layers.w]
        x = { to = [{ key_code = "a" }], color = "red" }
        "#,
    )
    .unwrap();

    assert!(matches!(spec.build_document(), Err(ConfigError::InvalidSpec(_))));
}

#[test]
fn test_invalid_leaf_reports_location() {
    let spec = SpecFile::parse(
        r#"
        [layers.o]
        c = "launch:Chrome"
        "#,
    )
    .unwrap();

    match spec.build_document() {
        Err(ConfigError::InvalidLeaf { location, .. }) => assert_eq!(location, "layers.o.c"),
        other => panic!("Expected InvalidLeaf, got {:?}", other),
    }
}

#[test]
fn test_non_string_leaf_rejected() {
    let spec = SpecFile::parse("[layers.o]\nc = 42\n").unwrap();
    assert!(matches!(spec.build_document(), Err(ConfigError::InvalidSpec(_))));
}

#[test]
fn test_compile_errors_surface() {
    let spec = SpecFile::parse("[layers.w]\n").unwrap();

    assert!(matches!(
        spec.build_document(),
        Err(ConfigError::Compile(CompileError::EmptyLayer(_)))
    ));
}

#[test]
fn test_unknown_section_rejected() {
    assert!(matches!(
        SpecFile::parse("[layer.o]\nc = \"app:Chrome\"\n"),
        Err(ConfigError::SpecSyntax(_))
    ));
}

#[test]
fn test_definitions_and_references() {
    let spec = SpecFile::parse(
        r#"
        [layers]
        w = "layer:window"

        [layers.o]
        w = "layer:window"

        [definitions.window]
        h = "key:ctrl+opt+left"
        l = "key:ctrl+opt+right"
        "#,
    )
    .unwrap();

    let document = spec.build_document().unwrap();
    let rules = &document.profiles[0].complex_modifications.rules;

    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].manipulators.len(), 3);
    assert_eq!(
        rules[1].manipulators[1].to,
        vec![ToEvent::set_variable("hyper_sublayer_o__w", 1)]
    );
}

#[test]
fn test_profile_overrides_replace_in_place() {
    let spec = SpecFile::parse(
        r#"
        [layers.o]
        c = "app:Google Chrome"

        [layers.b]
        t = "open:https://twitter.com"

        [[profiles]]
        name = "Work"
        selected = true

        [[profiles]]
        name = "Home"
        [profiles.layers.o]
        c = "app:Calendar"
        [profiles.layers.g]
        g = "app:Steam"
        "#,
    )
    .unwrap();

    let work = spec.layer_spec(&spec.profiles()[0]).unwrap();
    let home = spec.layer_spec(&spec.profiles()[1]).unwrap();

    let keys = |s: &crate::core::LayerSpec| s.root.iter().map(|(k, _)| k.to_string()).collect::<Vec<_>>();
    assert_eq!(keys(&work), vec!["o", "b"]);
    assert_eq!(keys(&home), vec!["o", "b", "g"]);

    let (_, o) = home.root.iter().next().unwrap();
    assert_eq!(
        o,
        &LayerNode::Layer(crate::core::LayerMapping::new().bind("c", Action::app("Calendar")))
    );

    let document = spec.build_document().unwrap();
    assert_eq!(document.profiles.len(), 2);
    assert_eq!(document.profiles[0].selected, Some(true));
    assert_eq!(document.profiles[1].selected, None);
}

#[test]
fn test_output_path_precedence() {
    let spec = SpecFile::parse("[output]\npath = \"/tmp/out/karabiner.json\"\n").unwrap();

    assert_eq!(
        spec.output_path(Some(Path::new("/explicit.json"))),
        PathBuf::from("/explicit.json")
    );
    assert_eq!(spec.output_path(None), PathBuf::from("/tmp/out/karabiner.json"));

    let default = SpecFile::default().output_path(None);
    assert!(default.ends_with(".config/karabiner/karabiner.json"));
    assert!(!default.to_string_lossy().starts_with('~'));
}

#[test]
fn test_keep_backups_default() {
    assert_eq!(SpecFile::default().keep_backups(), DEFAULT_KEEP_BACKUPS);
    let spec = SpecFile::parse("[output]\nkeep_backups = 3\n").unwrap();
    assert_eq!(spec.keep_backups(), 3);
}

#[test]
fn test_load_missing_file() {
    assert!(matches!(
        SpecFile::load(Path::new("/nonexistent/hyper.toml")),
        Err(ConfigError::NotFound(_))
    ));
}

#[test]
fn test_demo_spec_builds_and_validates() {
    let spec = SpecFile::parse(DEMO).unwrap();
    let document = spec.build_document().unwrap();

    let report = crate::config::DocumentValidator::new().validate(&document);
    assert!(!report.has_errors(), "{:?}", report.issues);

    let rules = &document.profiles[0].complex_modifications.rules;
    // Hyper rule, 3 passthrough rules, 13 layers
    assert_eq!(rules.len(), 17);
    assert_eq!(rules[0].description, "Hyper Key (⌃⌥⇧⌘)");
    assert_eq!(rules[4].description, "Hyper Key sublayer \"e\"");
    assert_eq!(rules[16].description, "Hyper Key sublayer \"w\"");

    assert_eq!(
        document.global.get("show_in_menu_bar"),
        Some(&serde_json::Value::Bool(false))
    );
}

#[test]
fn test_demo_spec_is_deterministic() {
    let first = SpecFile::parse(DEMO).unwrap().build_document().unwrap();
    let second = SpecFile::parse(DEMO).unwrap().build_document().unwrap();

    assert_eq!(first.to_pretty_json().unwrap(), second.to_pretty_json().unwrap());
}
