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


use thiserror::Error;

use crate::core::keys::KeyError;
use crate::core::parser::ParseError;
use crate::core::validator::ValidationError;

/// Specification errors detected while compiling layers.
///
/// All of them are fatal to the compilation run; nothing is written.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CompileError {
    /// Key identifier is not in the supported vocabulary.
    #[error("Unknown key name '{key}' under {path}")]
    UnknownKeyName { key: String, path: String },

    /// The same key appears twice directly under one layer.
    #[error("Duplicate key '{key}' under {path} (also written as '{first}')")]
    DuplicateLeaderKey {
        key: String,
        first: String,
        path: String,
    },

    /// A layer has no bindings.
    #[error("Layer {0} has no bindings")]
    EmptyLayer(String),

    /// A named definition refers back to itself.
    #[error("Cyclic layer reference: {}", .0.join(" -> "))]
    CyclicReference(Vec<String>),

    /// `layer:<name>` names a definition that does not exist.
    #[error("Unknown layer reference '{name}' under {path}")]
    UnknownLayerReference { name: String, path: String },

    /// An action or raw binding failed validation.
    #[error("Invalid binding '{key}' under {path}: {source}")]
    InvalidBinding {
        key: String,
        path: String,
        #[source]
        source: ValidationError,
    },

    /// Compile options are unusable (bad prefix, bad context pattern).
    #[error("Invalid compile options: {0}")]
    InvalidOptions(#[from] ValidationError),

    /// Leaf notation could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CompileError {
    /// Attaches path context to a bare key error.
    pub fn unknown_key(error: KeyError, path: impl ToString) -> Self {
        let key = match error {
            KeyError::UnknownKeyName(key) | KeyError::UnknownModifier(key) => key,
        };

        CompileError::UnknownKeyName {
            key,
            path: path.to_string(),
        }
    }
}
