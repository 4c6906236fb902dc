//! Enumerations crossing the boundary.
//!
//! The storage width must be pinned; otherwise adding a variant may widen
//! the type under already-compiled comparisons. Variants are only appended,
//! with fresh discriminants.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Violation;
use crate::scope::VersionScope;

/// Pinned storage width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Repr {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
}

impl Repr {
    /// Storage size in bytes.
    pub fn size(self) -> usize {
        match self {
            Repr::U8 | Repr::I8 => 1,
            Repr::U16 | Repr::I16 => 2,
            Repr::U32 | Repr::I32 => 4,
            Repr::U64 | Repr::I64 => 8,
        }
    }

    /// Whether a discriminant is representable.
    pub fn fits(self, value: i64) -> bool {
        match self {
            Repr::U8 => u8::try_from(value).is_ok(),
            Repr::U16 => u16::try_from(value).is_ok(),
            Repr::U32 => u32::try_from(value).is_ok(),
            Repr::U64 => value >= 0,
            Repr::I8 => i8::try_from(value).is_ok(),
            Repr::I16 => i16::try_from(value).is_ok(),
            Repr::I32 => i32::try_from(value).is_ok(),
            Repr::I64 => true,
        }
    }
}

impl fmt::Display for Repr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Repr::U8 => "u8",
            Repr::U16 => "u16",
            Repr::U32 => "u32",
            Repr::U64 => "u64",
            Repr::I8 => "i8",
            Repr::I16 => "i16",
            Repr::I32 => "i32",
            Repr::I64 => "i64",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDecl {
    pub name: String,
    pub value: i64,
}

impl VariantDecl {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A published enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    pub scope: VersionScope,
    #[serde(default)]
    pub repr: Option<Repr>,
    pub variants: Vec<VariantDecl>,
}

impl EnumDecl {
    pub fn new(name: impl Into<String>, scope: VersionScope, repr: Option<Repr>) -> Self {
        Self {
            name: name.into(),
            scope,
            repr,
            variants: Vec::new(),
        }
    }

    pub fn variant(mut self, name: impl Into<String>, value: i64) -> Self {
        self.variants.push(VariantDecl::new(name, value));
        self
    }

    /// Storage size, if pinned.
    pub fn storage_size(&self) -> Option<usize> {
        self.repr.map(Repr::size)
    }

    pub fn qualified_name(&self) -> String {
        self.scope.qualify(&self.name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| v.name == name)
    }
}

/// Check a single declaration on its own.
pub fn validate_enum(decl: &EnumDecl, require_pinned: bool) -> Vec<Violation> {
    let name = decl.qualified_name();
    let mut violations = Vec::new();

    match decl.repr {
        None if require_pinned => violations.push(Violation::UnpinnedEnum { name: name.clone() }),
        None => {}
        Some(repr) => {
            for variant in decl.variants.iter().filter(|v| !repr.fits(v.value)) {
                violations.push(Violation::VariantOutOfRange {
                    name: name.clone(),
                    variant: variant.name.clone(),
                    value: variant.value,
                    repr: repr.to_string(),
                });
            }
        }
    }

    let mut seen = BTreeSet::new();
    for variant in &decl.variants {
        if !seen.insert(variant.value) {
            violations.push(Violation::DuplicateDiscriminant {
                name: name.clone(),
                variant: variant.name.clone(),
                value: variant.value,
            });
        }
    }

    violations
}

/// Check that `new` is a compatible revision of `old`.
///
/// Returns the number of appended variants.
pub fn check_enum(old: &EnumDecl, new: &EnumDecl) -> Result<usize, Vec<Violation>> {
    let name = old.qualified_name();
    let mut violations = validate_enum(new, true);

    if let (Some(old_repr), Some(new_repr)) = (old.repr, new.repr) {
        if old_repr != new_repr {
            violations.push(Violation::EnumReprChanged {
                name: name.clone(),
                old: old_repr.to_string(),
                new: new_repr.to_string(),
            });
        }
    }

    for variant in &old.variants {
        match new.position(&variant.name) {
            None => violations.push(Violation::VariantRemoved {
                name: name.clone(),
                variant: variant.name.clone(),
            }),
            Some(j) if new.variants[j].value != variant.value => {
                violations.push(Violation::VariantRenumbered {
                    name: name.clone(),
                    variant: variant.name.clone(),
                    old: variant.value,
                    new: new.variants[j].value,
                })
            }
            Some(_) => {}
        }
    }

    let mut appended = 0;
    for (j, variant) in new.variants.iter().enumerate() {
        if old.position(&variant.name).is_some() {
            continue;
        }
        if j < old.variants.len() {
            violations.push(Violation::VariantInserted {
                name: name.clone(),
                variant: variant.name.clone(),
            });
        } else {
            appended += 1;
        }
    }

    if violations.is_empty() {
        Ok(appended)
    } else {
        Err(violations)
    }
}
