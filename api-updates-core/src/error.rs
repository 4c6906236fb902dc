//! Errors and rule violations.
//!
//! [`CompatError`] is returned when an operation cannot be carried out at
//! all (bad input, illegal state transition). [`Violation`] is data: one
//! breach of an evolution rule found while comparing two declarations.

use std::path::PathBuf;

use serde::Serialize;

/// Errors produced by the rules engine.
#[derive(Debug, thiserror::Error)]
pub enum CompatError {
    #[error("invalid version scope name: `{0}`")]
    InvalidScope(String),

    #[error("scope `{0}` has no successor")]
    ScopeExhausted(String),

    #[error("field `{record}.{field}` has no value and no documented default")]
    MissingDefault { record: String, field: String },

    #[error("`{record}` has no field `{field}`")]
    UnknownField { record: String, field: String },

    #[error("`{from}` cannot be converted to `{to}`")]
    IncompatibleConversion { from: String, to: String },

    #[error("interface `{interface}` already declares operation `{operation}`")]
    DuplicateOperation { interface: String, operation: String },

    #[error("interface `{interface}` has no operation `{operation}`")]
    UnknownOperation { interface: String, operation: String },

    #[error("interface `{interface}` is {state:?}; {action} is not permitted")]
    InvalidTransition {
        interface: String,
        state: crate::interface::ContractState,
        action: &'static str,
    },

    #[error("failed to read manifest {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to parse YAML manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON manifest: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompatError>;

/// How a violation would surface if the change shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// An old binary reads or writes memory whose meaning changed. Not
    /// detectable at runtime.
    SilentCorruption,
    /// An old binary expects a symbol that is no longer exported; the
    /// dynamic loader refuses to start it.
    UnresolvedSymbol,
    /// Two loaded binaries define the same symbol differently and the loader
    /// silently picks the first.
    OdrCollision,
    /// No compatible mitigation exists; the library and every dependent must
    /// be rebuilt and redeployed together.
    Irreducible,
}

/// A single breach of an evolution rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("field `{record}.{field}` was removed")]
    FieldRemoved { record: String, field: String },

    #[error("field `{record}.{field}` changed type from `{old}` to `{new}`")]
    FieldRetyped {
        record: String,
        field: String,
        old: String,
        new: String,
    },

    #[error("field `{record}.{field}` moved from position {old} to {new}")]
    FieldReordered {
        record: String,
        field: String,
        old: usize,
        new: usize,
    },

    #[error("field `{record}.{field}` was appended without a documented default")]
    FieldWithoutDefault { record: String, field: String },

    #[error("`{record}` changed layout inside its published scope `{scope}`")]
    LayoutChangedInPlace { record: String, scope: String },

    #[error("documented default of `{record}.{field}` changed from `{old}` to {}", describe_default(.new))]
    FieldDefaultChanged {
        record: String,
        field: String,
        old: String,
        new: Option<String>,
    },

    #[error("parameter `{param}` of `{function}` was removed")]
    ParamRemoved { function: String, param: String },

    #[error("parameter `{param}` of `{function}` changed type from `{old}` to `{new}`")]
    ParamRetyped {
        function: String,
        param: String,
        old: String,
        new: String,
    },

    #[error("parameter `{param}` of `{function}` moved from position {old} to {new}")]
    ParamReordered {
        function: String,
        param: String,
        old: usize,
        new: usize,
    },

    #[error("parameter `{param}` of `{function}` was appended without a default")]
    ParamWithoutDefault { function: String, param: String },

    #[error("default of parameter `{param}` of `{function}` changed from `{old}` to {}", describe_default(.new))]
    ParamDefaultChanged {
        function: String,
        param: String,
        old: String,
        new: Option<String>,
    },

    #[error("return type of `{function}` changed from `{old}` to `{new}`")]
    ReturnRetyped {
        function: String,
        old: String,
        new: String,
    },

    #[error("old-arity symbol `{symbol}` of `{function}` is no longer exported")]
    OldSymbolDropped { function: String, symbol: String },

    #[error("`{function}` gained parameters but exports no symbol for the new arity")]
    ArityChangedInPlace { function: String },

    #[error("`{function}` declares a defaulted parameter but adds {} symbols: {}", .symbols.len(), .symbols.join(", "))]
    CanonicalSymbolAmbiguous {
        function: String,
        symbols: Vec<String>,
    },

    #[error("operation `{interface}::{operation}` was removed")]
    OperationRemoved { interface: String, operation: String },

    #[error("operation `{interface}::{operation}` moved from slot {old} to {new}")]
    OperationReordered {
        interface: String,
        operation: String,
        old: usize,
        new: usize,
    },

    #[error("operation `{interface}::{operation}` changed signature from `{old}` to `{new}`")]
    OperationRetyped {
        interface: String,
        operation: String,
        old: String,
        new: String,
    },

    #[error("frozen interface `{interface}` gained operation `{operation}`")]
    FrozenInterfaceExtended { interface: String, operation: String },

    #[error("interface `{interface}` went back from {old:?} to {new:?}")]
    ContractStateRegressed {
        interface: String,
        old: crate::interface::ContractState,
        new: crate::interface::ContractState,
    },

    #[error("enum `{name}` has no pinned storage width")]
    UnpinnedEnum { name: String },

    #[error("enum `{name}` changed storage from `{old}` to `{new}`")]
    EnumReprChanged {
        name: String,
        old: String,
        new: String,
    },

    #[error("variant `{name}::{variant}` was removed")]
    VariantRemoved { name: String, variant: String },

    #[error("variant `{name}::{variant}` was renumbered from {old} to {new}")]
    VariantRenumbered {
        name: String,
        variant: String,
        old: i64,
        new: i64,
    },

    #[error("variant `{name}::{variant}` was inserted before existing variants")]
    VariantInserted { name: String, variant: String },

    #[error("variant `{name}::{variant}` = {value} does not fit `{repr}`")]
    VariantOutOfRange {
        name: String,
        variant: String,
        value: i64,
        repr: String,
    },

    #[error("variant `{name}::{variant}` reuses discriminant {value}")]
    DuplicateDiscriminant {
        name: String,
        variant: String,
        value: i64,
    },

    #[error("inline `{symbol}` changed without a new scope name")]
    InlineChangedInPlace { symbol: String },

    #[error("`{symbol}` is defined differently by `{first}` and `{other}`")]
    OdrCollision {
        symbol: String,
        first: String,
        other: String,
    },

    #[error("`{symbol}` is exported but not declared")]
    UnintendedExport { symbol: String },

    #[error("`{symbol}` is declared but not exported")]
    MissingSymbol { symbol: String },

    #[error("`{item}` was removed")]
    RemovedDeclaration { item: String },
}

fn describe_default(default: &Option<String>) -> String {
    match default {
        Some(value) => format!("`{}`", value),
        None => "no default".to_string(),
    }
}

impl Violation {
    /// How this violation would manifest in deployed binaries.
    pub fn failure_mode(&self) -> FailureMode {
        use Violation::*;
        match self {
            FieldWithoutDefault { .. }
            | LayoutChangedInPlace { .. }
            | FieldDefaultChanged { .. }
            | ParamWithoutDefault { .. }
            | ParamDefaultChanged { .. }
            | ArityChangedInPlace { .. }
            | CanonicalSymbolAmbiguous { .. }
            | FrozenInterfaceExtended { .. }
            | ContractStateRegressed { .. }
            | UnpinnedEnum { .. }
            | VariantInserted { .. }
            | VariantOutOfRange { .. }
            | DuplicateDiscriminant { .. } => FailureMode::SilentCorruption,

            OldSymbolDropped { .. } | MissingSymbol { .. } => FailureMode::UnresolvedSymbol,

            InlineChangedInPlace { .. } | OdrCollision { .. } | UnintendedExport { .. } => {
                FailureMode::OdrCollision
            }

            FieldRemoved { .. }
            | FieldRetyped { .. }
            | FieldReordered { .. }
            | ParamRemoved { .. }
            | ParamRetyped { .. }
            | ParamReordered { .. }
            | ReturnRetyped { .. }
            | OperationRemoved { .. }
            | OperationReordered { .. }
            | OperationRetyped { .. }
            | EnumReprChanged { .. }
            | VariantRemoved { .. }
            | VariantRenumbered { .. }
            | RemovedDeclaration { .. } => FailureMode::Irreducible,
        }
    }

    /// Whether a compatible rewrite of the change exists.
    pub fn is_mitigable(&self) -> bool {
        self.failure_mode() != FailureMode::Irreducible
    }
}
