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


//! src/core/mod.rs
//!
//! Core compilation logic
//!
//! This module turns a nested layer specification into engine rules:
//! - Key and modifier vocabulary with alias normalization
//! - Action and layer types, plus the compact leaf notation parser
//! - State variable allocation, layer compilation and rule emission
//! - Conflict detection over compiled manipulators
//!
//! Nothing here touches the filesystem, so every stage can be unit tested
//! on plain values.

pub mod allocator;
pub mod compiler;
pub mod conflict;
pub mod emitter;
pub mod encoder;
pub mod error;
pub mod keys;
pub mod parser;
pub mod types;
pub mod validator;

pub use allocator::{variable_name, VariableAllocator, DEFAULT_PREFIX};
pub use compiler::{BlockKind, Compilation, CompileOptions, LayerBlock, LayerCompiler};
pub use conflict::{Conflict, ConflictDetector, Trigger};
pub use emitter::{HyperKey, RuleEmitter};
pub use error::CompileError;
pub use keys::{KeyCode, KeyError, Modifier};
pub use parser::{parse_leaf, ParseError};
pub use types::*;
pub use validator::ValidationError;

use crate::karabiner::Rule;

/// Compiles a specification into one rule per root-level entry
///
/// ```
/// use hyper_sublayers::core::{compile, Action, CompileOptions, LayerMapping, LayerSpec};
///
/// let spec = LayerSpec::new(
///     LayerMapping::new().bind("o", LayerMapping::new().bind("c", Action::app("Google Chrome"))),
/// );
/// let rules = compile(&spec, &CompileOptions::default()).unwrap();
///
/// assert_eq!(rules[0].description, "Hyper Key sublayer \"o\"");
/// assert_eq!(rules[0].manipulators.len(), 2);
/// ```
pub fn compile(spec: &LayerSpec, options: &CompileOptions) -> Result<Vec<Rule>, CompileError> {
    let compilation = LayerCompiler::new(spec, options)?.compile()?;
    Ok(RuleEmitter::new(&options.label).emit(compilation.blocks))
}

#[cfg(test)]
mod tests;
