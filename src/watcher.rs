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


//! File system watcher for live spec file monitoring
//!
//! Uses OS-level file watching via the notify crate. The parent directory
//! is watched rather than the file itself: editors that save by writing a
//! temp file and renaming it over the original would otherwise detach the
//! watch after the first save.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::mpsc::{channel, Receiver, RecvTimeoutError},
    time::Duration,
};
use tracing::{debug, warn};

/// Quiet period that folds the burst of events from one save into one change
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches a spec file for modifications
pub struct SpecWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    file_name: OsString,
}

impl SpecWatcher {
    pub fn new(path: &Path) -> notify::Result<Self> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| notify::Error::path_not_found().add_path(path.to_path_buf()))?;

        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
        debug!(directory = %directory.display(), "watching for spec changes");

        Ok(SpecWatcher {
            _watcher: watcher,
            rx,
            file_name,
        })
    }

    /// Blocks until the spec file changes.
    ///
    /// Returns `false` once the underlying watcher has shut down.
    pub fn wait_for_change(&self) -> bool {
        loop {
            match self.rx.recv() {
                Ok(Ok(event)) if self.is_relevant(&event) => break,
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => warn!(error = %e, "watch error"),
                Err(_) => return false,
            }
        }

        loop {
            match self.rx.recv_timeout(DEBOUNCE) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => return true,
                Err(RecvTimeoutError::Disconnected) => return true,
            }
        }
    }

    /// Checks for file modification events (non-blocking)
    pub fn check_for_changes(&self) -> bool {
        let mut changed = false;
        while let Ok(event_result) = self.rx.try_recv() {
            if let Ok(event) = event_result {
                changed |= self.is_relevant(&event);
            }
        }
        changed
    }

    fn is_relevant(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
            && event
                .paths
                .iter()
                .any(|path| path.file_name() == Some(self.file_name.as_os_str()))
    }
}
