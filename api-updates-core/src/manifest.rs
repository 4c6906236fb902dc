//! Declarative description of a library's published surface.
//!
//! ```yaml
//! library: api-updates
//! records:
//!   - name: params
//!     scope: v0
//!     fields:
//!       - { name: name, type: AbiStr }
//! functions:
//!   - name: init
//!     scope: v0
//!     params: [{ name: params, type: "*const v0::params" }]
//!     returns: i32
//!     symbols: [api_v0_init]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::enumeration::EnumDecl;
use crate::error::{CompatError, Result};
use crate::function::FunctionDecl;
use crate::interface::InterfaceContract;
use crate::odr::InlineDefinition;
use crate::record::RecordDecl;
use crate::scope::VersionScope;

/// Everything a binary built against the library may depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiManifest {
    pub library: String,
    pub records: Vec<RecordDecl>,
    pub functions: Vec<FunctionDecl>,
    pub interfaces: Vec<InterfaceContract>,
    pub enums: Vec<EnumDecl>,
    pub inline: Vec<InlineDefinition>,
    /// Exported symbols not attached to a function (data, tables).
    pub symbols: Vec<String>,
}

impl AbiManifest {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            ..Default::default()
        }
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a manifest, choosing the format from the file extension.
    /// Anything other than `.json` is read as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|error| CompatError::Io {
            path: path.to_path_buf(),
            error,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&input),
            _ => Self::from_yaml_str(&input),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every symbol the library promises to export.
    pub fn declared_symbols(&self) -> BTreeSet<String> {
        self.functions
            .iter()
            .flat_map(|f| f.symbols.iter().cloned())
            .chain(self.symbols.iter().cloned())
            .collect()
    }

    /// Every scope something is declared in.
    pub fn scopes(&self) -> BTreeSet<VersionScope> {
        self.records
            .iter()
            .map(|r| r.scope.clone())
            .chain(self.functions.iter().map(|f| f.scope.clone()))
            .chain(self.interfaces.iter().map(|i| i.scope.clone()))
            .chain(self.enums.iter().map(|e| e.scope.clone()))
            .chain(self.inline.iter().map(|d| d.scope.clone()))
            .collect()
    }

    pub fn record(&self, scope: &VersionScope, name: &str) -> Option<&RecordDecl> {
        self.records
            .iter()
            .find(|r| &r.scope == scope && r.name == name)
    }

    pub fn function(&self, scope: &VersionScope, name: &str) -> Option<&FunctionDecl> {
        self.functions
            .iter()
            .find(|f| &f.scope == scope && f.name == name)
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceContract> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Latest revision of a record among scopes of the same kind and tag as
    /// `like`.
    pub fn latest_record(&self, name: &str, like: &VersionScope) -> Option<&RecordDecl> {
        self.records
            .iter()
            .filter(|r| {
                r.name == name && r.scope.kind() == like.kind() && r.scope.tag() == like.tag()
            })
            .max_by_key(|r| r.scope.version())
    }
}
