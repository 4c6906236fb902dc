//! Inline definitions and the one-definition rule.
//!
//! Inline code is compiled into every consumer. When several independently
//! built binaries end up in one process, the loader binds every reference to
//! a symbol to whichever definition it saw first. That is harmless only if
//! every copy is identical, so a changed body must always come with a new
//! scope name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Violation;
use crate::scope::VersionScope;

/// A piece of consumer-compiled code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineDefinition {
    pub scope: VersionScope,
    pub name: String,
    /// Source text of the definition. Layout whitespace is not significant;
    /// whitespace inside string and char literals is.
    pub body: String,
}

impl InlineDefinition {
    pub fn new(scope: VersionScope, name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
            body: body.into(),
        }
    }

    /// `inline_v0::bar`
    pub fn symbol(&self) -> String {
        self.scope.qualify(&self.name)
    }

    /// Hex SHA-256 of the normalized body.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(normalize(&self.body).as_bytes()))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Drop layout whitespace, keeping one space between adjacent identifier
/// characters. Literal contents are copied verbatim.
fn normalize(body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut pending_space = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            pending_space = true;
            i += 1;
            continue;
        }
        if pending_space && is_ident_char(c) && out.ends_with(is_ident_char) {
            out.push(' ');
        }
        pending_space = false;

        match c {
            '"' => {
                let hashes = out.chars().rev().take_while(|&h| h == '#').count();
                let raw = out.chars().rev().nth(hashes) == Some('r');
                i = copy_string(&chars, i, raw.then_some(hashes), &mut out);
            }
            '\'' if chars.get(i + 1) == Some(&'\\') => {
                // Escaped char literal: copy through the closing quote.
                let end = chars
                    .iter()
                    .skip(i + 3)
                    .position(|&q| q == '\'')
                    .map_or(chars.len(), |p| i + 3 + p + 1);
                out.extend(&chars[i..end]);
                i = end;
            }
            '\'' if chars.get(i + 2) == Some(&'\'') => {
                out.extend(&chars[i..i + 3]);
                i += 3;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Copy the string literal opening at `start`; returns the index after it.
fn copy_string(chars: &[char], start: usize, raw_hashes: Option<usize>, out: &mut String) -> usize {
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        match raw_hashes {
            None if c == '\\' => {
                if let Some(&escaped) = chars.get(i) {
                    out.push(escaped);
                    i += 1;
                }
            }
            None if c == '"' => return i,
            Some(hashes) if c == '"' => {
                let closing = chars[i..].iter().take(hashes).take_while(|&&h| h == '#').count();
                if closing == hashes {
                    out.extend(&chars[i..i + hashes]);
                    return i + hashes;
                }
            }
            _ => {}
        }
    }
    i
}

/// Flag inline definitions whose body changed while their symbol did not.
pub fn check_inline(old: &[InlineDefinition], new: &[InlineDefinition]) -> Vec<Violation> {
    let published: BTreeMap<String, String> = old
        .iter()
        .map(|def| (def.symbol(), def.fingerprint()))
        .collect();

    new.iter()
        .filter_map(|def| {
            let symbol = def.symbol();
            match published.get(&symbol) {
                Some(fingerprint) if *fingerprint != def.fingerprint() => {
                    Some(Violation::InlineChangedInPlace { symbol })
                }
                _ => None,
            }
        })
        .collect()
}

/// A binary with the inline definitions it embeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryImage {
    pub name: String,
    #[serde(default)]
    pub inline: Vec<InlineDefinition>,
}

impl BinaryImage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inline: Vec::new(),
        }
    }

    pub fn with(mut self, definition: InlineDefinition) -> Self {
        self.inline.push(definition);
        self
    }
}

#[derive(Debug, Clone)]
struct Resolution {
    binary: String,
    fingerprint: String,
}

/// Symbol bindings of a single process, in load order.
#[derive(Debug, Default)]
pub struct ProcessImage {
    loaded: Vec<String>,
    resolved: BTreeMap<String, Resolution>,
    violations: Vec<Violation>,
}

impl ProcessImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a binary. The first definition of every symbol wins.
    pub fn load(&mut self, image: &BinaryImage) {
        for def in &image.inline {
            let symbol = def.symbol();
            let fingerprint = def.fingerprint();
            match self.resolved.get(&symbol) {
                None => {
                    self.resolved.insert(
                        symbol,
                        Resolution {
                            binary: image.name.clone(),
                            fingerprint,
                        },
                    );
                }
                Some(existing) if existing.fingerprint != fingerprint => {
                    warn!(
                        symbol = %symbol,
                        first = %existing.binary,
                        other = %image.name,
                        "conflicting inline definitions; first loaded wins"
                    );
                    self.violations.push(Violation::OdrCollision {
                        symbol,
                        first: existing.binary.clone(),
                        other: image.name.clone(),
                    });
                }
                Some(existing) => {
                    debug!(symbol = %symbol, first = %existing.binary, "identical definition already bound");
                }
            }
        }
        self.loaded.push(image.name.clone());
    }

    /// Binaries in load order.
    pub fn loaded(&self) -> &[String] {
        &self.loaded
    }

    /// Binary whose definition every reference to `symbol` binds to.
    pub fn resolve(&self, symbol: &str) -> Option<&str> {
        self.resolved.get(symbol).map(|r| r.binary.as_str())
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}
