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


use std::path::PathBuf;
use thiserror::Error;

use crate::core::{CompileError, KeyError, ParseError};

/// Errors that can occur while loading a spec file or managing the output.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Spec or output file does not exist.
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    /// Backup directory cannot be created or written to.
    #[error("Backup directory not writable: {0}")]
    BackupDirNotWritable(PathBuf),
    /// Attempted to commit a transaction twice.
    #[error("Transaction already committed")]
    AlreadyCommitted,
    /// Failed to create backup file.
    #[error("Failed to create backup: {0}")]
    BackupFailed(String),
    /// Atomic write operation failed.
    #[error("Atomic write failed: {0}")]
    WriteFailed(String),
    /// The generated document has error-level issues.
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    /// Spec file is not valid TOML or has the wrong shape.
    #[error("Invalid spec file: {0}")]
    SpecSyntax(#[from] toml::de::Error),
    /// Spec file is valid TOML but violates a structural rule.
    #[error("Invalid spec file: {0}")]
    InvalidSpec(String),
    /// A leaf string could not be parsed.
    #[error("Invalid binding at {location}: {source}")]
    InvalidLeaf {
        location: String,
        #[source]
        source: ParseError,
    },
    /// Unknown `[hyper]` key or similar vocabulary error.
    #[error(transparent)]
    Key(#[from] KeyError),
    /// Layer compilation failed.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// Output document could not be (de)serialised.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Generic I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
