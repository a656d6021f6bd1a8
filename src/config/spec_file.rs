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


//! src/config/spec_file.rs
//!
//! TOML spec file loader
//!
//! A spec file describes the whole output: passthrough settings and rules,
//! the optional Hyper key, and the layer tree. Layer tables nest naturally
//! in TOML:
//!
//! ```toml
//! [hyper]
//! key = "spacebar"
//!
//! [layers.o]
//! c = "app:Google Chrome"
//!
//! [layers.i.l]
//! 1 = "input:id=^com\\.apple\\.keylayout\\.ABC$"
//! ```
//!
//! Inside `layers`, `definitions` and `profiles.layers`:
//! - a string is a leaf in the compact notation (`parser.rs`)
//! - a table with a `to` entry is a raw binding
//! - any other table is a nested layer
//!
//! Key order is preserved (`toml` is built with `preserve_order`), so the
//! generated rules follow the order of the file.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::core::{
    compile, parse_leaf, CompileOptions, HyperKey, KeyCode,
    LayerMapping, LayerNode, LayerSpec, RawBinding, RuleEmitter,
};
use crate::karabiner::{ComplexModifications, Condition, Document, Profile, Rule, ToEvent};

/// Output location when nothing else is configured
pub const DEFAULT_OUTPUT_PATH: &str = "~/.config/karabiner/karabiner.json";

/// Backups kept after each build unless `[output].keep_backups` says otherwise
pub const DEFAULT_KEEP_BACKUPS: usize = 10;

/// Default name of the Hyper state variable
pub const DEFAULT_HYPER_VARIABLE: &str = "hyper";

const DEFAULT_PROFILE: &str = "Default";

/// `[output]`
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub path: Option<String>,
    pub keep_backups: Option<usize>,
}

/// `[hyper]`
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HyperSection {
    pub key: String,

    #[serde(default = "default_hyper_variable")]
    pub variable: String,

    /// Variables forced to 0 whenever the Hyper key goes down
    #[serde(default)]
    pub reset: Vec<String>,
}

fn default_hyper_variable() -> String {
    DEFAULT_HYPER_VARIABLE.to_string()
}

/// `[compile]`
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CompileSection {
    pub variable_prefix: Option<String>,
    pub label: Option<String>,

    /// Bundle identifier patterns where no layer manipulator applies
    #[serde(default)]
    pub exclude_apps: Vec<String>,
}

/// `[[profiles]]`
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProfileSection {
    pub name: String,

    #[serde(default)]
    pub selected: Option<bool>,

    /// Entries merged over the top-level `[layers]`
    #[serde(default)]
    pub layers: toml::Table,
}

/// A parsed spec file
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SpecFile {
    #[serde(default)]
    pub output: OutputSection,

    /// Passed through to the document untouched
    #[serde(default)]
    pub global: Map<String, Value>,

    pub hyper: Option<HyperSection>,

    #[serde(default)]
    pub compile: CompileSection,

    /// Passthrough rules, emitted before the layer rules
    #[serde(default)]
    pub rules: Vec<Rule>,

    #[serde(default)]
    pub layers: toml::Table,

    #[serde(default)]
    pub definitions: toml::Table,

    #[serde(default)]
    pub profiles: Vec<ProfileSection>,
}

impl SpecFile {
    /// Parses spec file content.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a spec file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let spec = Self::parse(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), layers = spec.layers.len(), "loaded spec file");
        Ok(spec)
    }

    /// Resolves where the document is written.
    ///
    /// `explicit` (the CLI flag or `KARABINER_CONFIG`) wins over
    /// `[output].path`, which wins over the engine's default location.
    pub fn output_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return expand_path(&path.to_string_lossy());
        }

        let configured = self.output.path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH);
        expand_path(configured)
    }

    pub fn keep_backups(&self) -> usize {
        self.output.keep_backups.unwrap_or(DEFAULT_KEEP_BACKUPS)
    }

    /// Profiles to generate; one selected "Default" profile if none are listed
    pub fn profiles(&self) -> Vec<ProfileSection> {
        if !self.profiles.is_empty() {
            return self.profiles.clone();
        }

        vec![ProfileSection {
            name: DEFAULT_PROFILE.to_string(),
            selected: Some(true),
            layers: toml::Table::new(),
        }]
    }

    /// The Hyper key, if configured
    pub fn hyper_key(&self) -> Result<Option<HyperKey>, ConfigError> {
        let Some(section) = &self.hyper else {
            return Ok(None);
        };

        let mut hyper = HyperKey::new(KeyCode::parse(&section.key)?, section.variable.clone());
        hyper.reset = section.reset.clone();
        Ok(Some(hyper))
    }

    /// Compile options derived from `[compile]` and `[hyper]`
    pub fn compile_options(&self) -> Result<CompileOptions, ConfigError> {
        let mut options = CompileOptions::default();

        if let Some(prefix) = &self.compile.variable_prefix {
            options.variable_prefix = prefix.clone();
        }
        if let Some(label) = &self.compile.label {
            options.label = label.clone();
        }

        if let Some(hyper) = &self.hyper {
            // A Hyper variable inside the layer namespace could alias a leader
            if hyper.variable.starts_with(&format!("{}_", options.variable_prefix)) {
                return Err(ConfigError::InvalidSpec(format!(
                    "Hyper variable '{}' collides with the layer variable prefix '{}'",
                    hyper.variable, options.variable_prefix
                )));
            }
            options.root_conditions = vec![Condition::variable_if(&hyper.variable, 1)];
        }

        if !self.compile.exclude_apps.is_empty() {
            options.context_conditions = vec![Condition::FrontmostApplicationUnless {
                bundle_identifiers: self.compile.exclude_apps.clone(),
            }];
        }

        Ok(options)
    }

    /// The layer specification for one profile
    pub fn layer_spec(&self, profile: &ProfileSection) -> Result<LayerSpec, ConfigError> {
        let mut root = layer_mapping(&self.layers, "layers")?;

        let location = format!("profiles.{}.layers", profile.name);
        for (key, value) in &profile.layers {
            root.replace_or_insert(key.as_str(), layer_node(value, &format!("{}.{}", location, key))?);
        }

        let mut spec = LayerSpec::new(root);
        for (name, value) in &self.definitions {
            let location = format!("definitions.{}", name);
            let table = value.as_table().ok_or_else(|| {
                ConfigError::InvalidSpec(format!("{} must be a table", location))
            })?;
            spec = spec.with_definition(name.as_str(), layer_mapping(table, &location)?);
        }

        Ok(spec)
    }

    /// Compiles every profile into the complete output document.
    ///
    /// Any error aborts the whole build; there is no partial document.
    pub fn build_document(&self) -> Result<Document, ConfigError> {
        let options = self.compile_options()?;
        let emitter = RuleEmitter::new(&options.label);
        let hyper = self.hyper_key()?;

        let mut profiles = Vec::new();
        for section in self.profiles() {
            let spec = self.layer_spec(&section)?;

            let mut rules = Vec::new();
            if let Some(hyper) = &hyper {
                reject_hyper_shadowing(hyper, &spec, &section.name)?;
                rules.push(emitter.hyper_rule(hyper));
            }
            rules.extend(self.rules.iter().cloned());
            rules.extend(compile(&spec, &options)?);

            info!(profile = %section.name, rules = rules.len(), "compiled profile");

            profiles.push(Profile {
                name: section.name,
                selected: section.selected,
                complex_modifications: ComplexModifications { rules },
            });
        }

        Ok(Document {
            global: self.global.clone(),
            profiles,
        })
    }
}

/// The Hyper rule is unconditional and comes first, so a root entry on the
/// same physical key could never fire
fn reject_hyper_shadowing(
    hyper: &HyperKey,
    spec: &LayerSpec,
    profile: &str,
) -> Result<(), ConfigError> {
    for (key, _) in spec.root.iter() {
        // Unknown names are reported by the compiler
        if KeyCode::parse(key).ok() == Some(hyper.key) {
            return Err(ConfigError::InvalidSpec(format!(
                "layers.{} (profile '{}') uses the Hyper key '{}' and would never fire",
                key, profile, hyper.key
            )));
        }
    }
    Ok(())
}

/// Expands `~` and environment variables, leaving the path as-is on failure
fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).as_ref()),
    }
}

/// Converts a TOML table into a layer mapping
pub fn layer_mapping(table: &toml::Table, location: &str) -> Result<LayerMapping, ConfigError> {
    let mut mapping = LayerMapping::new();

    for (key, value) in table {
        let node = layer_node(value, &format!("{}.{}", location, key))?;
        mapping.insert(key.as_str(), node);
    }

    Ok(mapping)
}

fn layer_node(value: &toml::Value, location: &str) -> Result<LayerNode, ConfigError> {
    match value {
        toml::Value::String(leaf) => parse_leaf(leaf).map_err(|source| ConfigError::InvalidLeaf {
            location: location.to_string(),
            source,
        }),
        toml::Value::Table(table) if table.contains_key("to") => {
            Ok(LayerNode::Raw(raw_binding(table, location)?))
        }
        toml::Value::Table(table) => Ok(LayerNode::Layer(layer_mapping(table, location)?)),
        other => Err(ConfigError::InvalidSpec(format!(
            "{}: expected a binding string or a table, found {}",
            location,
            other.type_str()
        ))),
    }
}

fn raw_binding(table: &toml::Table, location: &str) -> Result<RawBinding, ConfigError> {
    let mut to = Vec::new();
    let mut description = None;

    for (field, value) in table {
        match (field.as_str(), value) {
            ("to", toml::Value::Array(events)) => {
                for event in events {
                    let json = serde_json::to_value(event)?;
                    to.push(serde_json::from_value::<ToEvent>(json)?);
                }
            }
            ("description", toml::Value::String(text)) => description = Some(text.clone()),
            _ => {
                return Err(ConfigError::InvalidSpec(format!(
                    "{}: unexpected field '{}' in raw binding",
                    location, field
                )))
            }
        }
    }

    Ok(RawBinding { to, description })
}
