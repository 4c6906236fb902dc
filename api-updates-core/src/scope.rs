//! Version scopes.
//!
//! A scope is the unit of freezing: everything declared inside `v0` keeps its
//! layout and link names forever, and an incompatible revision goes into `v1`
//! instead. Inline scopes (`inline_v0`) hold code that consumers compile into
//! their own binaries; an optional representation tag (`inline_v0_utf8`)
//! separates inline code that depends on how text is represented.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompatError;

const INLINE_PREFIX: &str = "inline_";

/// Whether a scope holds exported definitions or consumer-compiled code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// Definitions live in the library and are reached through its symbols.
    Stable,
    /// Definitions are embedded in every consumer that uses them.
    Inline,
}

/// A named, closed grouping of declarations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionScope {
    kind: ScopeKind,
    version: u32,
    tag: Option<String>,
}

impl VersionScope {
    /// Stable scope `v{version}`.
    pub const fn stable(version: u32) -> Self {
        Self {
            kind: ScopeKind::Stable,
            version,
            tag: None,
        }
    }

    /// Inline scope `inline_v{version}`.
    pub const fn inline(version: u32) -> Self {
        Self {
            kind: ScopeKind::Inline,
            version,
            tag: None,
        }
    }

    /// Attach a representation tag, e.g. `utf8`.
    ///
    /// Tags must be lowercase ASCII alphanumerics.
    pub fn tagged(mut self, tag: impl Into<String>) -> Result<Self, CompatError> {
        let tag = tag.into();
        if !is_valid_tag(&tag) {
            return Err(CompatError::InvalidScope(format!("{}_{}", self.name(), tag)));
        }
        self.tag = Some(tag);
        Ok(self)
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn is_inline(&self) -> bool {
        self.kind == ScopeKind::Inline
    }

    /// The scope's name as it appears in paths and link names.
    pub fn name(&self) -> String {
        let prefix = match self.kind {
            ScopeKind::Stable => "",
            ScopeKind::Inline => INLINE_PREFIX,
        };
        match &self.tag {
            Some(tag) => format!("{}v{}_{}", prefix, self.version, tag),
            None => format!("{}v{}", prefix, self.version),
        }
    }

    /// The scope that supersedes this one. Kind and tag are preserved.
    pub fn next(&self) -> Result<Self, CompatError> {
        let version = self
            .version
            .checked_add(1)
            .ok_or_else(|| CompatError::ScopeExhausted(self.name()))?;
        Ok(Self {
            kind: self.kind,
            version,
            tag: self.tag.clone(),
        })
    }

    /// Whether `other` is a later revision of the same kind and tag.
    pub fn supersedes(&self, other: &VersionScope) -> bool {
        self.kind == other.kind && self.tag == other.tag && self.version > other.version
    }

    /// Path-qualified item name: `v0::init`.
    pub fn qualify(&self, item: &str) -> String {
        format!("{}::{}", self.name(), item)
    }

    /// Exported link name: `api_v0_init`.
    pub fn link_name(&self, prefix: &str, item: &str) -> String {
        format!("{}_{}_{}", prefix, self.name(), item)
    }
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

impl fmt::Display for VersionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for VersionScope {
    type Err = CompatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CompatError::InvalidScope(s.to_string());

        let (kind, rest) = match s.strip_prefix(INLINE_PREFIX) {
            Some(rest) => (ScopeKind::Inline, rest),
            None => (ScopeKind::Stable, s),
        };
        let rest = rest.strip_prefix('v').ok_or_else(invalid)?;
        let (digits, tag) = match rest.split_once('_') {
            Some((digits, tag)) => (digits, Some(tag)),
            None => (rest, None),
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let version = digits.parse::<u32>().map_err(|_| invalid())?;

        let scope = Self {
            kind,
            version,
            tag: None,
        };
        match tag {
            Some(tag) => scope.tagged(tag).map_err(|_| invalid()),
            None => Ok(scope),
        }
    }
}

impl TryFrom<String> for VersionScope {
    type Error = CompatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionScope> for String {
    fn from(scope: VersionScope) -> Self {
        scope.name()
    }
}
