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


//! src/core/parser.rs
//!
//! Leaf notation parser
//!
//! Spec files describe leaf bindings with a compact `kind:argument` string:
//! - `app:Google Chrome` → launch an application
//! - `open:raycast://extensions/...` → open a URL or URI scheme
//! - `shell:shortcuts run "Focus"` → run a shell command
//! - `key:ctrl+opt+cmd+spacebar` → emit a key chord
//! - `input:id=^com\.apple\.keylayout\.ABC$` → select an input source
//!   (`id=`, `lang=` / `language=`, `mode=`)
//! - `layer:window` → reuse a named layer definition
//!
//! # Architecture
//! The parser uses nom combinators for the prefix and chord grammar. It only
//! structures data; key names are resolved through the vocabulary in
//! `keys.rs` and nothing is validated beyond syntax here.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, space0},
    combinator::{rest, value},
    multi::separated_list1,
    sequence::{preceded, terminated},
    IResult, Parser,
};
use thiserror::Error;

use crate::core::keys::{modifier_group, KeyCode, KeyError, Modifier};
use crate::core::types::{Action, KeyChord, LayerNode};
use crate::karabiner::InputSourceSelector;

/// Parse errors with the offending input attached
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Cannot parse binding '{input}': {message}")]
    InvalidSyntax { input: String, message: String },

    #[error("Binding '{input}' has an empty argument")]
    EmptyArgument { input: String },

    #[error("Modifier '{0}' cannot be emitted, only matched")]
    ModifierNotEmittable(Modifier),

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Leaf kinds recognised before the `:`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LeafKind {
    App,
    Open,
    Shell,
    Key,
    Input,
    Layer,
}

/// Which field of an input-source selector an `input:` leaf sets
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputField {
    Id,
    Language,
    Mode,
}

/// Parse a complete leaf string into a layer node
///
/// # Example
/// ```
/// use hyper_sublayers::core::parser::parse_leaf;
/// use hyper_sublayers::core::{Action, LayerNode};
///
/// let node = parse_leaf("app:Figma").unwrap();
/// assert_eq!(node, LayerNode::Action(Action::app("Figma")));
/// ```
pub fn parse_leaf(input: &str) -> Result<LayerNode, ParseError> {
    let trimmed = input.trim();

    let (argument, kind) = parse_leaf_kind(trimmed).map_err(|e| ParseError::InvalidSyntax {
        input: input.to_string(),
        message: format!("expected app:, open:, shell:, key:, input: or layer: ({:?})", e),
    })?;

    let argument = argument.trim();
    if argument.is_empty() {
        return Err(ParseError::EmptyArgument {
            input: input.to_string(),
        });
    }

    let node = match kind {
        LeafKind::App => Action::app(argument).into(),
        LeafKind::Open => Action::open(argument).into(),
        LeafKind::Shell => Action::shell(argument).into(),
        LeafKind::Key => Action::key(parse_chord(argument)?).into(),
        LeafKind::Input => Action::SelectInputSource(parse_input_source(argument)?).into(),
        LeafKind::Layer => LayerNode::Reference(argument.to_string()),
    };

    Ok(node)
}

/// Parse the `kind:` prefix of a leaf
///
/// Returns the remaining input (the argument) and the recognised kind.
pub fn parse_leaf_kind(input: &str) -> IResult<&str, LeafKind> {
    terminated(
        alt((
            value(LeafKind::App, tag("app")),
            value(LeafKind::Open, tag("open")),
            value(LeafKind::Shell, tag("shell")),
            value(LeafKind::Key, tag("key")),
            value(LeafKind::Input, tag("input")),
            value(LeafKind::Layer, tag("layer")),
        )),
        (space0, char(':'), space0),
    )
    .parse(input)
}

/// Split a chord into its `+`-separated tokens
pub fn chord_tokens(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char('+'), take_while1(|c: char| c != '+')).parse(input)
}

/// Parse a key chord
///
/// The last token is the key; every earlier token is a modifier name, a
/// modifier alias (`cmd`, `opt` …) or a group (`hyper`, `meh`).
///
/// Formats supported:
/// - "spacebar" (no modifiers)
/// - "cmd+shift+grave" (aliases)
/// - "hyper+t" (group)
pub fn parse_chord(input: &str) -> Result<KeyChord, ParseError> {
    let (remaining, tokens) = chord_tokens(input.trim()).map_err(|e| ParseError::InvalidSyntax {
        input: input.to_string(),
        message: format!("{:?}", e),
    })?;

    if !remaining.is_empty() {
        return Err(ParseError::InvalidSyntax {
            input: input.to_string(),
            message: format!("unexpected trailing input '{}'", remaining),
        });
    }

    let (key, modifier_tokens) = match tokens.split_last() {
        Some(split) => split,
        None => {
            return Err(ParseError::EmptyArgument {
                input: input.to_string(),
            })
        }
    };

    let mut modifiers = Vec::new();
    for token in modifier_tokens {
        if let Some(group) = modifier_group(token) {
            modifiers.extend_from_slice(group);
            continue;
        }

        let modifier = Modifier::parse(token)?;
        if modifier == Modifier::Any {
            return Err(ParseError::ModifierNotEmittable(modifier));
        }
        modifiers.push(modifier);
    }

    Ok(KeyChord::new(KeyCode::parse(key)?, modifiers))
}

/// Parse a `field=pattern` input-source selector
pub fn parse_input_field(input: &str) -> IResult<&str, (InputField, &str)> {
    (
        alt((
            value(InputField::Id, tag("id")),
            value(InputField::Language, alt((tag("language"), tag("lang")))),
            value(InputField::Mode, tag("mode")),
        )),
        preceded((space0, char('='), space0), rest),
    )
        .parse(input)
}

/// Parse the argument of an `input:` leaf
pub fn parse_input_source(input: &str) -> Result<InputSourceSelector, ParseError> {
    let (_, (field, pattern)) = parse_input_field(input.trim()).map_err(|e| {
        ParseError::InvalidSyntax {
            input: input.to_string(),
            message: format!("expected id=, lang= or mode= ({:?})", e),
        }
    })?;

    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(ParseError::EmptyArgument {
            input: input.to_string(),
        });
    }

    let mut selector = InputSourceSelector::default();
    let slot = match field {
        InputField::Id => &mut selector.input_source_id,
        InputField::Language => &mut selector.language,
        InputField::Mode => &mut selector.input_mode_id,
    };
    *slot = Some(pattern.to_string());

    Ok(selector)
}
