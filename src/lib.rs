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


//! Hyper Sublayers
//!
//! Compiles a nested "leader key → key → action" specification into
//! Karabiner-Elements complex-modification rules.
//!
//! Holding the Hyper key and then a leader key activates a sublayer; the
//! next key press inside it dispatches an action (launch an app, open a
//! URL, send a chord, switch input source …). Sublayers nest to any depth.
//!
//! # Features
//!
//! - **Layer Compiler:** One activation manipulator per sublayer, gated
//!   dispatch manipulators per binding, deterministic output
//! - **Leaf Notation:** `app:Figma`, `key:ctrl+opt+left`, `open:raycast://…`
//! - **Conflict Detection:** Shadowed manipulators are reported before writing
//! - **Automatic Backups:** Timestamped backups before every write
//! - **Atomic Operations:** Safe file writes with rollback on failure
//! - **Watch Mode:** Rebuilds whenever the spec file changes
//!
//! # Architecture
//!
//! - **`core`:** Compilation (keys, leaf parser, allocator, encoder,
//!   compiler, emitter, conflict detection)
//! - **`karabiner`:** The `karabiner.json` document model
//! - **`config`:** Spec file loading and output file operations (atomic
//!   writes, backups, validation)
//! - **`watcher`:** Spec file change notifications
//!
//! # Examples
//!
//! ## Compiling a layer tree
//!
//! ```
//! use hyper_sublayers::core::{compile, Action, CompileOptions, LayerMapping, LayerSpec};
//!
//! let spec = LayerSpec::new(
//!     LayerMapping::new().bind(
//!         "b",
//!         LayerMapping::new()
//!             .bind("t", Action::open("https://twitter.com"))
//!             .bind("y", Action::open("https://news.ycombinator.com")),
//!     ),
//! );
//!
//! let rules = compile(&spec, &CompileOptions::default())?;
//! assert_eq!(rules.len(), 1);
//! assert_eq!(rules[0].manipulators.len(), 3);
//! # Ok::<(), hyper_sublayers::core::CompileError>(())
//! ```
//!
//! ## Building a document from a spec file
//!
//! ```no_run
//! use hyper_sublayers::config::SpecFile;
//! use std::path::Path;
//!
//! let spec = SpecFile::load(Path::new("hyper.toml"))?;
//! let document = spec.build_document()?;
//! println!("{}", document.to_pretty_json()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod core;
pub mod karabiner;
pub mod watcher;

// Re-export commonly used types for convenience
pub use core::{compile, Action, CompileOptions, LayerMapping, LayerNode, LayerSpec};
pub use karabiner::Document;
