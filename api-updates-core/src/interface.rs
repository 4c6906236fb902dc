//! Append-only interface contracts.
//!
//! An interface is an ordered list of operations dispatched across the
//! binary boundary. Its lifecycle is `Draft -> Published -> Frozen`:
//! drafts may change freely, published contracts only grow at the end, and
//! frozen contracts never change again.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CompatError, Violation};
use crate::scope::VersionScope;

/// Lifecycle state of an interface contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractState {
    Draft,
    Published,
    Frozen,
}

/// One slot in the dispatch table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDecl {
    pub name: String,
    pub signature: String,
}

impl OperationDecl {
    pub fn new(name: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
        }
    }
}

/// Ordered list of abstract operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceContract {
    pub name: String,
    pub scope: VersionScope,
    pub state: ContractState,
    #[serde(default)]
    pub operations: Vec<OperationDecl>,
}

impl InterfaceContract {
    pub fn draft(name: impl Into<String>, scope: VersionScope) -> Self {
        Self {
            name: name.into(),
            scope,
            state: ContractState::Draft,
            operations: Vec::new(),
        }
    }

    pub fn state(&self) -> ContractState {
        self.state
    }

    pub fn operations(&self) -> &[OperationDecl] {
        &self.operations
    }

    /// Number of published slots.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Slot index of an operation.
    pub fn slot(&self, operation: &str) -> Option<usize> {
        self.operations.iter().position(|op| op.name == operation)
    }

    /// Append an operation after the last existing one.
    pub fn push_operation(&mut self, operation: OperationDecl) -> Result<usize, CompatError> {
        if self.state == ContractState::Frozen {
            return Err(self.invalid("appending an operation"));
        }
        if self.slot(&operation.name).is_some() {
            return Err(CompatError::DuplicateOperation {
                interface: self.name.clone(),
                operation: operation.name,
            });
        }
        debug!(interface = %self.name, operation = %operation.name, slot = self.len(), "operation appended");
        self.operations.push(operation);
        Ok(self.operations.len() - 1)
    }

    /// Remove an operation. Only drafts may lose operations.
    pub fn remove_operation(&mut self, operation: &str) -> Result<OperationDecl, CompatError> {
        if self.state != ContractState::Draft {
            return Err(self.invalid("removing an operation"));
        }
        let slot = self
            .slot(operation)
            .ok_or_else(|| CompatError::UnknownOperation {
                interface: self.name.clone(),
                operation: operation.to_string(),
            })?;
        Ok(self.operations.remove(slot))
    }

    /// Draft -> Published. Publishing twice is a no-op.
    pub fn publish(&mut self) -> Result<(), CompatError> {
        match self.state {
            ContractState::Draft | ContractState::Published => {
                self.state = ContractState::Published;
                Ok(())
            }
            ContractState::Frozen => Err(self.invalid("publishing")),
        }
    }

    /// Published -> Frozen. Freezing twice is a no-op.
    pub fn freeze(&mut self) -> Result<(), CompatError> {
        match self.state {
            ContractState::Published | ContractState::Frozen => {
                self.state = ContractState::Frozen;
                Ok(())
            }
            ContractState::Draft => Err(self.invalid("freezing")),
        }
    }

    /// Whether a binary built when this contract had `assumed_len` slots may
    /// dispatch through the current table.
    pub fn admits(&self, assumed_len: usize) -> bool {
        assumed_len <= self.len()
    }

    fn invalid(&self, action: &'static str) -> CompatError {
        CompatError::InvalidTransition {
            interface: self.name.clone(),
            state: self.state,
            action,
        }
    }
}

/// Check that `new` is a compatible revision of `old`.
///
/// Returns the number of appended operations.
pub fn check_extension(
    old: &InterfaceContract,
    new: &InterfaceContract,
) -> Result<usize, Vec<Violation>> {
    if old.state == ContractState::Draft {
        return Ok(new.len().saturating_sub(old.len()));
    }

    let mut violations = Vec::new();
    if new.state < old.state {
        violations.push(Violation::ContractStateRegressed {
            interface: old.name.clone(),
            old: old.state,
            new: new.state,
        });
    }
    for (i, op) in old.operations.iter().enumerate() {
        match new.slot(&op.name) {
            None => violations.push(Violation::OperationRemoved {
                interface: old.name.clone(),
                operation: op.name.clone(),
            }),
            Some(j) => {
                if i != j {
                    violations.push(Violation::OperationReordered {
                        interface: old.name.clone(),
                        operation: op.name.clone(),
                        old: i,
                        new: j,
                    });
                }
                let moved = &new.operations[j];
                if moved.signature != op.signature {
                    violations.push(Violation::OperationRetyped {
                        interface: old.name.clone(),
                        operation: op.name.clone(),
                        old: op.signature.clone(),
                        new: moved.signature.clone(),
                    });
                }
            }
        }
    }

    let appended: Vec<&OperationDecl> = new
        .operations
        .iter()
        .skip(old.len())
        .filter(|op| old.slot(&op.name).is_none())
        .collect();

    if old.state == ContractState::Frozen {
        for op in &appended {
            violations.push(Violation::FrozenInterfaceExtended {
                interface: old.name.clone(),
                operation: op.name.clone(),
            });
        }
    }

    if violations.is_empty() {
        Ok(appended.len())
    } else {
        Err(violations)
    }
}
