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


//! src/core/keys.rs
//!
//! Physical key and modifier vocabulary
//!
//! Karabiner-Elements identifies keys by `key_code` names such as
//! `spacebar` or `open_bracket`. Only names from the fixed table below are
//! accepted; authors may also use a handful of aliases (`space`, `esc`,
//! `[`, `cmd` …) which are normalised to the canonical engine name before
//! anything else sees them. Normalising up front means `space` and
//! `spacebar` are recognised as the same leader key.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Key vocabulary errors
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum KeyError {
    /// Key name is not part of the supported vocabulary
    #[error("Unknown key name '{0}'")]
    UnknownKeyName(String),

    /// Modifier name is not recognised
    #[error("Unknown modifier '{0}'")]
    UnknownModifier(String),
}

/// Canonical Karabiner `key_code` names
const KEY_CODES: &[&str] = &[
    // Letters
    "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m",
    "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
    // Number row
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "0",
    // Control keys
    "return_or_enter", "escape", "delete_or_backspace", "delete_forward",
    "tab", "spacebar", "caps_lock",
    // Punctuation
    "hyphen", "equal_sign", "open_bracket", "close_bracket", "backslash",
    "non_us_pound", "semicolon", "quote", "grave_accent_and_tilde", "comma",
    "period", "slash", "non_us_backslash",
    // Function keys
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
    "f13", "f14", "f15", "f16", "f17", "f18", "f19", "f20",
    // Navigation
    "up_arrow", "down_arrow", "left_arrow", "right_arrow",
    "page_up", "page_down", "home", "end", "insert",
    // Modifier keys (valid as `from`/`to` key codes)
    "left_control", "left_shift", "left_option", "left_command",
    "right_control", "right_shift", "right_option", "right_command", "fn",
    // Media and system
    "volume_increment", "volume_decrement", "mute",
    "display_brightness_increment", "display_brightness_decrement",
    "play_or_pause", "fastforward", "rewind",
    "print_screen", "scroll_lock", "pause", "application",
];

/// Author-facing aliases mapped to canonical names
const KEY_ALIASES: &[(&str, &str)] = &[
    ("space", "spacebar"),
    ("esc", "escape"),
    ("enter", "return_or_enter"),
    ("return", "return_or_enter"),
    ("backspace", "delete_or_backspace"),
    ("delete", "delete_forward"),
    ("capslock", "caps_lock"),
    ("up", "up_arrow"),
    ("down", "down_arrow"),
    ("left", "left_arrow"),
    ("right", "right_arrow"),
    ("pageup", "page_up"),
    ("pagedown", "page_down"),
    ("-", "hyphen"),
    ("minus", "hyphen"),
    ("=", "equal_sign"),
    ("equal", "equal_sign"),
    ("[", "open_bracket"),
    ("]", "close_bracket"),
    ("\\", "backslash"),
    (";", "semicolon"),
    ("'", "quote"),
    ("`", "grave_accent_and_tilde"),
    ("grave", "grave_accent_and_tilde"),
    (",", "comma"),
    (".", "period"),
    ("/", "slash"),
];

/// A physical key from the supported vocabulary
///
/// Always holds the canonical engine name, so two `KeyCode`s compare equal
/// exactly when they address the same physical key.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct KeyCode(&'static str);

impl KeyCode {
    /// Resolves a key name or alias (case-insensitive) to its canonical form
    pub fn parse(name: &str) -> Result<Self, KeyError> {
        let lowered = name.trim().to_lowercase();

        if let Some(canonical) = KEY_CODES.iter().copied().find(|k| *k == lowered) {
            return Ok(Self(canonical));
        }

        KEY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map(|(_, canonical)| Self(*canonical))
            .ok_or_else(|| KeyError::UnknownKeyName(name.to_string()))
    }

    /// Canonical engine name
    pub fn name(self) -> &'static str {
        self.0
    }

    /// Every canonical key in vocabulary order
    pub fn all() -> impl Iterator<Item = KeyCode> {
        KEY_CODES.iter().map(|k| KeyCode(*k))
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Serialize for KeyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for KeyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        KeyCode::parse(&name).map_err(de::Error::custom)
    }
}

/// Modifier keys as understood by the engine
///
/// Variant order is the canonical output order (⌃⌥⇧⌘, left before right).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    LeftControl,
    LeftOption,
    LeftShift,
    LeftCommand,
    RightControl,
    RightOption,
    RightShift,
    RightCommand,
    /// Either control key
    Control,
    /// Either option key
    Option,
    /// Either shift key
    Shift,
    /// Either command key
    Command,
    Fn,
    CapsLock,
    /// Wildcard; only meaningful as an optional `from` modifier
    Any,
}

impl Modifier {
    /// Resolves a modifier name or alias (case-insensitive)
    ///
    /// Short aliases (`ctrl`, `opt`, `cmd`, `lshift`) refer to the left-hand key,
    /// matching what a bare modifier press sends on a Mac keyboard. The full
    /// side-less names (`control`, `option`, `shift`, `command`) match either side.
    pub fn parse(name: &str) -> Result<Self, KeyError> {
        let modifier = match name.trim().to_lowercase().as_str() {
            "left_control" | "ctrl" | "ctl" | "lctrl" | "⌃" => Modifier::LeftControl,
            "left_option" | "opt" | "alt" | "lopt" | "lalt" | "⌥" => Modifier::LeftOption,
            "left_shift" | "lshift" | "⇧" => Modifier::LeftShift,
            "left_command" | "cmd" | "lcmd" | "⌘" => Modifier::LeftCommand,
            "right_control" | "rctrl" => Modifier::RightControl,
            "right_option" | "ropt" | "ralt" => Modifier::RightOption,
            "right_shift" | "rshift" => Modifier::RightShift,
            "right_command" | "rcmd" => Modifier::RightCommand,
            "control" => Modifier::Control,
            "option" => Modifier::Option,
            "shift" => Modifier::Shift,
            "command" => Modifier::Command,
            "fn" => Modifier::Fn,
            "caps_lock" => Modifier::CapsLock,
            "any" => Modifier::Any,
            _ => return Err(KeyError::UnknownModifier(name.to_string())),
        };

        Ok(modifier)
    }

    /// Engine name of the modifier
    pub fn name(self) -> &'static str {
        match self {
            Modifier::LeftControl => "left_control",
            Modifier::LeftOption => "left_option",
            Modifier::LeftShift => "left_shift",
            Modifier::LeftCommand => "left_command",
            Modifier::RightControl => "right_control",
            Modifier::RightOption => "right_option",
            Modifier::RightShift => "right_shift",
            Modifier::RightCommand => "right_command",
            Modifier::Control => "control",
            Modifier::Option => "option",
            Modifier::Shift => "shift",
            Modifier::Command => "command",
            Modifier::Fn => "fn",
            Modifier::CapsLock => "caps_lock",
            Modifier::Any => "any",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expands modifier group shorthands
///
/// `hyper` is all four left-hand modifiers, `meh` is hyper without command.
pub fn modifier_group(name: &str) -> Option<&'static [Modifier]> {
    const HYPER: &[Modifier] = &[
        Modifier::LeftControl,
        Modifier::LeftOption,
        Modifier::LeftShift,
        Modifier::LeftCommand,
    ];
    const MEH: &[Modifier] = &[
        Modifier::LeftControl,
        Modifier::LeftOption,
        Modifier::LeftShift,
    ];

    match name.trim().to_lowercase().as_str() {
        "hyper" => Some(HYPER),
        "meh" => Some(MEH),
        _ => None,
    }
}
