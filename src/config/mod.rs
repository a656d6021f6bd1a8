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


//! Output file management with atomic writes and backup support.
//!
//! This module owns everything that touches the filesystem:
//!
//! - **Spec loading** (`spec_file`): TOML spec → layer specs → document
//! - **Build** (`pipeline`): spec file → validated, committed output
//! - **Atomic writes**: Uses temp-file-then-rename to prevent corruption
//! - **Automatic backups**: Every write creates a timestamped backup
//! - **Rollback safety**: Failed transactions leave the previous output untouched
//! - **Validation**: The generated document is checked before it is committed
//!
//! # Example
//!
//! ```no_run
//! use hyper_sublayers::config::{ConfigManager, ConfigTransaction};
//!
//! let manager = ConfigManager::new("/Users/me/.config/karabiner/karabiner.json".into())?;
//!
//! let mut tx = ConfigTransaction::begin(&manager)?;
//! tx.commit("{}\n")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use atomic_write_file::AtomicWriteFile;
use chrono::{Local, NaiveDateTime};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::karabiner::Document;

pub mod error;
pub mod pipeline;
pub mod spec_file;
pub mod transaction;
pub mod validator;

pub use error::ConfigError;
pub use pipeline::{build, BuildSummary};
pub use spec_file::SpecFile;
pub use transaction::ConfigTransaction;
pub use validator::{DocumentValidator, ValidationLevel, ValidationReport};

/// Timestamp suffix of backup files
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Manages the generated engine configuration file.
///
/// The output may not exist yet (first build); everything that reads it
/// reports `ConfigError::NotFound` in that case. Backups live in a
/// `backups/` directory next to the output.
#[derive(Debug)]
pub struct ConfigManager {
    /// Path to the generated `karabiner.json`.
    output_path: PathBuf,
    backup_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for `output_path`, creating its directory and the
    /// backup directory as needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::BackupDirNotWritable` if the backup directory
    /// cannot be created or is read-only.
    pub fn new(output_path: PathBuf) -> Result<Self, ConfigError> {
        // Warn if output is a symlink (dotfile managers do this), but allow it
        if output_path.read_link().is_ok() {
            warn!(path = %output_path.display(), "output file is a symlink");
        }

        // e.g., ~/.config/karabiner/karabiner.json → ~/.config/karabiner/backups/
        let parent = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let backup_dir = parent.join("backups");

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| ConfigError::BackupDirNotWritable(backup_dir.clone()))?;
        }

        if backup_dir.metadata()?.permissions().readonly() {
            return Err(ConfigError::BackupDirNotWritable(backup_dir));
        }

        Ok(Self {
            output_path,
            backup_dir,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Whether the output file currently exists
    pub fn exists(&self) -> bool {
        self.output_path.exists()
    }

    /// Reads the current output file content.
    pub fn read_current(&self) -> Result<String, ConfigError> {
        if !self.exists() {
            return Err(ConfigError::NotFound(self.output_path.clone()));
        }
        Ok(fs::read_to_string(&self.output_path)?)
    }

    /// Reads and parses the current output file.
    pub fn read_document(&self) -> Result<Document, ConfigError> {
        Ok(Document::from_json(&self.read_current()?)?)
    }

    fn file_name(&self) -> Result<&str, ConfigError> {
        self.output_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                ConfigError::BackupFailed(format!(
                    "Output path has no UTF-8 file name: {}",
                    self.output_path.display()
                ))
            })
    }

    /// Copies the current output to `backups/<name>.<YYYY-MM-DD_HHMMSS>`.
    pub fn create_timestamped_backup(&self) -> Result<PathBuf, ConfigError> {
        let content = self.read_current()?;

        let timestamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup_path = self
            .backup_dir
            .join(format!("{}.{}", self.file_name()?, timestamp));

        fs::write(&backup_path, &content)
            .map_err(|e| ConfigError::BackupFailed(format!("{}: {}", backup_path.display(), e)))?;

        info!(backup = %backup_path.display(), "created backup");
        Ok(backup_path)
    }

    /// Lists backups of this output, newest first.
    ///
    /// Files whose suffix is not a valid timestamp are ignored.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let prefix = format!("{}.", self.file_name()?);
        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(suffix) = name.strip_prefix(&prefix) else {
                continue;
            };

            if let Ok(timestamp) = NaiveDateTime::parse_from_str(suffix, BACKUP_TIMESTAMP_FORMAT) {
                backups.push((timestamp, path));
            }
        }

        backups.sort_by(|a, b| b.cmp(a));
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }

    /// Deletes all but the `keep` most recent backups.
    ///
    /// Returns the number of backups deleted.
    pub fn cleanup_old_backups(&self, keep: usize) -> Result<usize, ConfigError> {
        let mut deleted = 0;

        for backup in self.list_backups()?.iter().skip(keep) {
            fs::remove_file(backup)?;
            debug!(backup = %backup.display(), "deleted old backup");
            deleted += 1;
        }

        Ok(deleted)
    }

    /// Restores the output from a backup.
    ///
    /// The current output, if any, is backed up first so the restore itself
    /// can be undone.
    pub fn restore_backup(&self, backup_path: &Path) -> Result<(), ConfigError> {
        if !backup_path.exists() {
            return Err(ConfigError::NotFound(backup_path.to_path_buf()));
        }

        let content = fs::read_to_string(backup_path)?;

        if self.exists() {
            self.create_timestamped_backup()?;
        }

        self.write_atomic(&content)?;
        info!(backup = %backup_path.display(), "restored backup");
        Ok(())
    }

    /// Replaces the output file atomically (temp file + rename).
    pub(crate) fn write_atomic(&self, content: &str) -> Result<(), ConfigError> {
        let mut file = AtomicWriteFile::options()
            .open(&self.output_path)
            .map_err(|e| ConfigError::WriteFailed(format!("Failed to open for atomic write: {}", e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| ConfigError::WriteFailed(format!("Failed to write content: {}", e)))?;

        file.commit()
            .map_err(|e| ConfigError::WriteFailed(format!("Failed to commit atomic write: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
