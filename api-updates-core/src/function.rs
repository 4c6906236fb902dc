//! Versioned functions.
//!
//! Parameters are never removed, reordered or retyped. New parameters are
//! appended with a default, and every symbol an older binary could have
//! bound to stays exported, delegating to the new form with that default.

use serde::{Deserialize, Serialize};

use crate::error::Violation;
use crate::scope::VersionScope;

/// A single parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ParamDecl {
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

/// How a function gained parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Old-arity and new-arity forms are both published; the old one
    /// delegates with the default filled in.
    Overload,
    /// One declaration with a defaulted parameter for newly built callers,
    /// plus the old symbol kept for existing binaries.
    DefaultedParameter,
}

/// Pick a strategy for adding a parameter.
///
/// When clients take the function's address, the defaulted form keeps a
/// single canonical symbol for newly built code.
pub fn recommend_strategy(captures_address: bool) -> Strategy {
    if captures_address {
        Strategy::DefaultedParameter
    } else {
        Strategy::Overload
    }
}

fn default_return() -> String {
    "void".to_string()
}

/// A published callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub scope: VersionScope,
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    #[serde(default = "default_return")]
    pub returns: String,
    /// Every link name this function is reachable through.
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, scope: VersionScope) -> Self {
        Self {
            name: name.into(),
            scope,
            params: Vec::new(),
            returns: default_return(),
            symbols: Vec::new(),
            strategy: None,
        }
    }

    pub fn param(mut self, param: ParamDecl) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.returns = ty.into();
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbols.push(symbol.into());
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn qualified_name(&self) -> String {
        self.scope.qualify(&self.name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }
}

/// Outcome of a compatible function revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionChange {
    Unchanged,
    Extended {
        params: Vec<ParamDecl>,
        strategy: Strategy,
    },
}

/// Check that `new` is a compatible revision of `old`.
///
/// The strategy declared on `new` takes precedence over `strategy`.
pub fn check_function(
    old: &FunctionDecl,
    new: &FunctionDecl,
    strategy: Strategy,
) -> Result<FunctionChange, Vec<Violation>> {
    let strategy = new.strategy.unwrap_or(strategy);
    let function = old.qualified_name();
    let mut violations = Vec::new();

    for (i, param) in old.params.iter().enumerate() {
        match new.position(&param.name) {
            None => violations.push(Violation::ParamRemoved {
                function: function.clone(),
                param: param.name.clone(),
            }),
            Some(j) => {
                if i != j {
                    violations.push(Violation::ParamReordered {
                        function: function.clone(),
                        param: param.name.clone(),
                        old: i,
                        new: j,
                    });
                }
                let moved = &new.params[j];
                if moved.ty != param.ty {
                    violations.push(Violation::ParamRetyped {
                        function: function.clone(),
                        param: param.name.clone(),
                        old: param.ty.clone(),
                        new: moved.ty.clone(),
                    });
                }
                // Old-arity symbols fill in the published default.
                if let Some(old_default) = &param.default {
                    if moved.default.as_ref() != Some(old_default) {
                        violations.push(Violation::ParamDefaultChanged {
                            function: function.clone(),
                            param: param.name.clone(),
                            old: old_default.clone(),
                            new: moved.default.clone(),
                        });
                    }
                }
            }
        }
    }

    if old.returns != new.returns {
        violations.push(Violation::ReturnRetyped {
            function: function.clone(),
            old: old.returns.clone(),
            new: new.returns.clone(),
        });
    }

    let appended: Vec<ParamDecl> = new
        .params
        .iter()
        .skip(old.params.len())
        .filter(|p| old.position(&p.name).is_none())
        .cloned()
        .collect();

    for param in appended.iter().filter(|p| p.default.is_none()) {
        violations.push(Violation::ParamWithoutDefault {
            function: function.clone(),
            param: param.name.clone(),
        });
    }

    for symbol in &old.symbols {
        if !new.symbols.contains(symbol) {
            violations.push(Violation::OldSymbolDropped {
                function: function.clone(),
                symbol: symbol.clone(),
            });
        }
    }

    let added: Vec<String> = new
        .symbols
        .iter()
        .filter(|s| !old.symbols.contains(s))
        .cloned()
        .collect();

    if !appended.is_empty() {
        if added.is_empty() {
            violations.push(Violation::ArityChangedInPlace { function });
        } else if strategy == Strategy::DefaultedParameter && added.len() > 1 {
            violations.push(Violation::CanonicalSymbolAmbiguous {
                function,
                symbols: added,
            });
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }
    if appended.is_empty() {
        Ok(FunctionChange::Unchanged)
    } else {
        Ok(FunctionChange::Extended {
            params: appended,
            strategy,
        })
    }
}
