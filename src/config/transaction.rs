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


//! Output transaction management with automatic backups
//!
//! Provides atomic write operations with rollback.

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

use crate::config::{
    validator::{DocumentValidator, ValidationLevel::Error, ValidationLevel::Warning},
    ConfigError, ConfigManager,
};
use crate::karabiner::Document;

/// Atomic output transaction with automatic backup.
///
/// - **Atomic**: Changes are all-or-nothing (atomic file operations)
/// - **Consistent**: The output is never in a half-written state
/// - **Durable**: Backup created before any modifications
///
/// # Lifecycle
///
/// 1. `begin()` - Creates timestamped backup immediately (if the output exists)
/// 2. Caller compiles and validates the new document (in memory)
/// 3. `commit()` - Writes atomically, or `rollback()` - Restores the previous state
///
/// # Example
///
/// ```no_run
/// use hyper_sublayers::config::{ConfigManager, ConfigTransaction};
/// use std::path::PathBuf;
///
/// let manager = ConfigManager::new(PathBuf::from("karabiner.json"))?;
/// let mut tx = ConfigTransaction::begin(&manager)?;
///
/// if let Err(e) = tx.commit("{}\n") {
///     eprintln!("Commit failed: {}", e);
///     tx.rollback()?;
/// }
/// # Ok::<(), hyper_sublayers::config::ConfigError>(())
/// ```
pub struct ConfigTransaction<'a> {
    manager: &'a ConfigManager,
    backup_path: Option<PathBuf>,
    /// Whether the output existed when the transaction began
    existed: bool,
    committed: bool,
}

impl<'a> ConfigTransaction<'a> {
    /// Begins a new transaction by creating a timestamped backup.
    ///
    /// No backup is taken when the output does not exist yet; rolling back
    /// then removes whatever was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be written (no changes made).
    pub fn begin(manager: &'a ConfigManager) -> Result<Self, ConfigError> {
        let existed = manager.exists();

        // Rollback point
        let backup_path = if existed {
            Some(manager.create_timestamped_backup()?)
        } else {
            None
        };

        Ok(Self {
            manager,
            backup_path,
            existed,
            committed: false,
        })
    }

    /// Begins a transaction without taking a backup (`--no-backup`).
    ///
    /// Such a transaction can only be rolled back if the output did not
    /// exist beforehand.
    pub fn begin_without_backup(manager: &'a ConfigManager) -> Self {
        Self {
            manager,
            backup_path: None,
            existed: manager.exists(),
            committed: false,
        }
    }

    /// The backup taken by `begin()`, if any
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Validates `document`, then commits its JSON rendering.
    ///
    /// Error-level issues block the commit and leave the output untouched;
    /// warnings are logged and the commit proceeds.
    pub fn commit_with_validation(&mut self, document: &Document) -> Result<(), ConfigError> {
        let report = DocumentValidator::new().validate(document);

        if report.has_errors() {
            let error_count = report
                .issues
                .iter()
                .filter(|i| i.validation_level == Error)
                .count();

            for issue in report.issues.iter().filter(|i| i.validation_level == Error) {
                error!(rule = %issue.rule, "{}", issue.message);
            }

            return Err(ConfigError::ValidationFailed(format!(
                "{} validation error(s) detected",
                error_count
            )));
        }

        for issue in report.issues.iter().filter(|i| i.validation_level == Warning) {
            warn!(rule = %issue.rule, "{}", issue.message);
        }

        self.commit(&document.to_pretty_json()?)
    }

    /// Atomically replaces the output with `new_content`.
    ///
    /// If this fails the previous output is untouched and the backup from
    /// `begin()` is still available.
    pub fn commit(&mut self, new_content: &str) -> Result<(), ConfigError> {
        if self.committed {
            return Err(ConfigError::AlreadyCommitted);
        }

        self.manager.write_atomic(new_content)?;
        self.committed = true;

        info!(
            path = %self.manager.output_path().display(),
            bytes = new_content.len(),
            "committed output"
        );
        Ok(())
    }

    /// Restores the state from before `begin()`.
    ///
    /// Rewrites the backup atomically, or removes the output if it did not
    /// exist when the transaction began.
    pub fn rollback(&self) -> Result<(), ConfigError> {
        if let Some(backup_path) = &self.backup_path {
            let backup_content = fs::read_to_string(backup_path)?;
            self.manager.write_atomic(&backup_content)?;

            info!(backup = %backup_path.display(), "rolled back output");
            return Ok(());
        }

        if self.existed {
            return Err(ConfigError::BackupFailed(
                "No backup available for rollback".to_string(),
            ));
        }

        if self.manager.exists() {
            fs::remove_file(self.manager.output_path())?;
        }
        info!("rolled back output (removed new file)");
        Ok(())
    }
}
