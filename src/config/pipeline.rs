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


//! Spec file → `karabiner.json` in one step
//!
//! Everything that can fail on the spec (parsing, compilation, validation)
//! fails before the output is touched: the output is either fully replaced
//! or left exactly as it was.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{ConfigError, ConfigManager, ConfigTransaction, SpecFile};

/// What a successful build wrote
#[derive(Debug)]
pub struct BuildSummary {
    pub output_path: PathBuf,
    /// Backup of the previous output, if one was taken
    pub backup_path: Option<PathBuf>,
    pub profiles: usize,
    pub rules: usize,
    /// Old backups pruned after the write
    pub removed_backups: usize,
}

/// Compiles the spec at `spec_path` and replaces the output in one transaction.
///
/// `output` (the CLI flag or `KARABINER_CONFIG`) overrides `[output].path`.
pub fn build(
    spec_path: &Path,
    output: Option<&Path>,
    no_backup: bool,
) -> Result<BuildSummary, ConfigError> {
    let spec = SpecFile::load(spec_path)?;
    let document = spec.build_document()?;

    let manager = ConfigManager::new(spec.output_path(output))?;
    let mut transaction = if no_backup {
        ConfigTransaction::begin_without_backup(&manager)
    } else {
        ConfigTransaction::begin(&manager)?
    };
    let backup_path = transaction.backup_path().map(Path::to_path_buf);

    transaction.commit_with_validation(&document)?;

    let removed_backups = manager.cleanup_old_backups(spec.keep_backups())?;
    if removed_backups > 0 {
        info!(removed = removed_backups, "removed old backups");
    }

    Ok(BuildSummary {
        output_path: manager.output_path().to_path_buf(),
        backup_path,
        profiles: document.profiles.len(),
        rules: document
            .profiles
            .iter()
            .map(|p| p.complex_modifications.rules.len())
            .sum(),
        removed_backups,
    })
}
