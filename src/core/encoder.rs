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


//! Action encoder
//!
//! Maps each `Action` to the engine events that perform it. The match below
//! has no wildcard arm, so a new action kind without an encoding is a
//! compile error rather than a silently skipped binding.

use crate::core::types::Action;
use crate::karabiner::ToEvent;

/// Encodes an action as the `to` events of a dispatch manipulator
pub fn encode(action: &Action) -> Vec<ToEvent> {
    match action {
        Action::KeyChord(chord) => vec![ToEvent::chord(chord.key, chord.modifiers.clone())],
        Action::ShellCommand { command } => vec![shell(command.clone())],
        Action::OpenTarget { uri } => vec![shell(format!("open {}", quote_if_needed(uri)))],
        Action::LaunchApp { name } => vec![shell(format!(
            "open -a {}",
            single_quote(&format!("{}.app", name))
        ))],
        Action::SelectInputSource(selector) => vec![ToEvent::select_input_source(selector.clone())],
    }
}

/// Human-readable description used for the manipulator's `description`
pub fn describe(action: &Action) -> String {
    match action {
        Action::KeyChord(chord) => format!("Send {}", chord),
        Action::ShellCommand { command } => command.clone(),
        Action::OpenTarget { uri } => format!("Open {}", uri),
        Action::LaunchApp { name } => format!("Launch {}", name),
        Action::SelectInputSource(selector) => format!("Select input source {}", selector),
    }
}

fn shell(command: String) -> ToEvent {
    ToEvent::shell_command(command)
}

/// Wraps `value` in single quotes for `/bin/sh`
fn single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Quotes only when `value` contains characters the shell would interpret
fn quote_if_needed(value: &str) -> String {
    let plain = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,~#".contains(c));

    if plain {
        value.to_string()
    } else {
        single_quote(value)
    }
}
