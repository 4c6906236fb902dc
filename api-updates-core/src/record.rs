//! Versioned records.
//!
//! Once a record is published its existing fields keep their position and
//! type. A revision may only append fields, each with a documented default,
//! and must live in a new scope so binaries built against the old layout keep
//! resolving it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CompatError, Violation};
use crate::scope::VersionScope;

/// A single field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    /// Value a shim supplies when the caller's shape predates this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A published aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    pub scope: VersionScope,
    pub fields: Vec<FieldDecl>,
}

impl RecordDecl {
    pub fn new(name: impl Into<String>, scope: VersionScope, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            scope,
            fields,
        }
    }

    /// `v0::params`
    pub fn qualified_name(&self) -> String {
        self.scope.qualify(&self.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Outcome of a compatible record revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    Unchanged,
    Appended { fields: Vec<FieldDecl> },
}

/// Check that `new` is a compatible revision of `old`.
pub fn check_record(old: &RecordDecl, new: &RecordDecl) -> Result<RecordChange, Vec<Violation>> {
    let record = old.qualified_name();
    let mut violations = Vec::new();

    for (i, field) in old.fields.iter().enumerate() {
        match new.position(&field.name) {
            None => violations.push(Violation::FieldRemoved {
                record: record.clone(),
                field: field.name.clone(),
            }),
            Some(j) => {
                if j != i {
                    violations.push(Violation::FieldReordered {
                        record: record.clone(),
                        field: field.name.clone(),
                        old: i,
                        new: j,
                    });
                }
                let moved = &new.fields[j];
                if moved.ty != field.ty {
                    violations.push(Violation::FieldRetyped {
                        record: record.clone(),
                        field: field.name.clone(),
                        old: field.ty.clone(),
                        new: moved.ty.clone(),
                    });
                }
                if let Some(old_default) = &field.default {
                    if moved.default.as_ref() != Some(old_default) {
                        violations.push(Violation::FieldDefaultChanged {
                            record: record.clone(),
                            field: field.name.clone(),
                            old: old_default.clone(),
                            new: moved.default.clone(),
                        });
                    }
                }
            }
        }
    }

    let appended: Vec<FieldDecl> = new
        .fields
        .iter()
        .skip(old.fields.len())
        .filter(|f| old.position(&f.name).is_none())
        .cloned()
        .collect();

    for field in appended.iter().filter(|f| f.default.is_none()) {
        violations.push(Violation::FieldWithoutDefault {
            record: record.clone(),
            field: field.name.clone(),
        });
    }

    // Consumers compile inline records into their own code, so any edit at
    // all needs a new scope name.
    let layout_changed = if old.scope.is_inline() {
        old.fields != new.fields
    } else {
        !appended.is_empty() || new.fields.len() != old.fields.len()
    };
    if layout_changed && old.scope == new.scope {
        violations.push(Violation::LayoutChangedInPlace {
            record,
            scope: old.scope.name(),
        });
    }

    if !violations.is_empty() {
        return Err(violations);
    }
    if appended.is_empty() {
        Ok(RecordChange::Unchanged)
    } else {
        Ok(RecordChange::Appended { fields: appended })
    }
}

/// Translation of values built against an old record shape into the current
/// one. This is the model of a compatibility shim.
#[derive(Debug)]
pub struct Conversion<'a> {
    from: &'a RecordDecl,
    to: &'a RecordDecl,
}

impl<'a> Conversion<'a> {
    /// Build a conversion, refusing revisions that are not append-only.
    pub fn new(from: &'a RecordDecl, to: &'a RecordDecl) -> Result<Self, CompatError> {
        check_record(from, to).map_err(|_| CompatError::IncompatibleConversion {
            from: from.qualified_name(),
            to: to.qualified_name(),
        })?;
        Ok(Self { from, to })
    }

    /// Fields the old shape cannot provide.
    pub fn synthesized_fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.to
            .fields
            .iter()
            .filter(move |f| self.from.field(&f.name).is_none())
    }

    /// Map old-shape values to the new shape.
    ///
    /// Prior fields are copied verbatim; every other field takes its
    /// documented default. A field that ends up with no value is an error.
    pub fn apply(
        &self,
        values: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, CompatError> {
        if let Some(unknown) = values.keys().find(|k| self.from.field(k).is_none()) {
            return Err(CompatError::UnknownField {
                record: self.from.qualified_name(),
                field: unknown.clone(),
            });
        }

        let mut out = BTreeMap::new();
        for field in &self.to.fields {
            let value = match (values.get(&field.name), &field.default) {
                (Some(value), _) => value.clone(),
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(CompatError::MissingDefault {
                        record: self.to.qualified_name(),
                        field: field.name.clone(),
                    })
                }
            };
            out.insert(field.name.clone(), value);
        }
        Ok(out)
    }
}
