//! Comparison of a published manifest with the current one.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::enumeration::{check_enum, validate_enum};
use crate::error::{FailureMode, Violation};
use crate::function::{check_function, recommend_strategy, FunctionChange};
use crate::interface::check_extension;
use crate::manifest::AbiManifest;
use crate::odr::check_inline;
use crate::policy::Policy;
use crate::record::{check_record, RecordChange};

/// Result of comparing two manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompatReport {
    pub library: String,
    pub violations: Vec<Violation>,
    /// Compatible changes that were found, for the changelog.
    pub changes: Vec<String>,
}

impl CompatReport {
    /// No binary built against the baseline breaks.
    pub fn is_compatible(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations that can only be resolved by rebuilding every dependent.
    pub fn irreducible(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.failure_mode() == FailureMode::Irreducible)
    }

    /// Violation counts per failure mode.
    pub fn by_failure_mode(&self) -> BTreeMap<FailureMode, usize> {
        let mut counts = BTreeMap::new();
        for v in &self.violations {
            *counts.entry(v.failure_mode()).or_insert(0) += 1;
        }
        counts
    }

    /// One line per finding.
    pub fn summary(&self) -> String {
        let mut out = if self.is_compatible() {
            format!(
                "{}: compatible ({} change(s))\n",
                self.library,
                self.changes.len()
            )
        } else {
            format!(
                "{}: {} violation(s)\n",
                self.library,
                self.violations.len()
            )
        };
        for v in &self.violations {
            out.push_str(&format!("  error[{:?}]: {}\n", v.failure_mode(), v));
        }
        for change in &self.changes {
            out.push_str(&format!("  ok: {}\n", change));
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    fn extend(&mut self, violations: Vec<Violation>) {
        self.violations.extend(violations);
    }
}

/// Compare the published `baseline` with the `current` surface.
pub fn compare(baseline: &AbiManifest, current: &AbiManifest, policy: &Policy) -> CompatReport {
    let mut report = CompatReport {
        library: current.library.clone(),
        ..Default::default()
    };

    compare_records(baseline, current, &mut report);
    compare_functions(baseline, current, &mut report);
    compare_interfaces(baseline, current, &mut report);
    compare_enums(baseline, current, policy, &mut report);

    report.extend(check_inline(&baseline.inline, &current.inline));

    let declared = current.declared_symbols();
    for symbol in &baseline.symbols {
        if !declared.contains(symbol) {
            report.violations.push(Violation::MissingSymbol {
                symbol: symbol.clone(),
            });
        }
    }

    for v in &report.violations {
        warn!(library = %report.library, failure_mode = ?v.failure_mode(), "{}", v);
    }
    info!(
        library = %report.library,
        violations = report.violations.len(),
        changes = report.changes.len(),
        "compatibility check complete"
    );
    report
}

fn compare_records(baseline: &AbiManifest, current: &AbiManifest, report: &mut CompatReport) {
    // Published scopes are retained verbatim.
    for old in &baseline.records {
        match current.record(&old.scope, &old.name) {
            None => report.violations.push(Violation::RemovedDeclaration {
                item: old.qualified_name(),
            }),
            Some(new) => {
                if let Err(violations) = check_record(old, new) {
                    report.extend(violations);
                }
            }
        }
    }

    // Revisions in new scopes must extend the latest published layout.
    for new in &current.records {
        if baseline.record(&new.scope, &new.name).is_some() {
            continue;
        }
        let Some(old) = baseline.latest_record(&new.name, &new.scope) else {
            report.changes.push(format!("new record `{}`", new.qualified_name()));
            continue;
        };
        match check_record(old, new) {
            Ok(RecordChange::Appended { fields }) => {
                let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
                report.changes.push(format!(
                    "`{}` extends `{}` with {}",
                    new.qualified_name(),
                    old.qualified_name(),
                    names.join(", ")
                ));
            }
            Ok(RecordChange::Unchanged) => {
                debug!(record = %new.qualified_name(), "record re-declared without changes");
            }
            Err(violations) => report.extend(violations),
        }
    }
}

fn compare_functions(baseline: &AbiManifest, current: &AbiManifest, report: &mut CompatReport) {
    for old in &baseline.functions {
        let Some(new) = current.function(&old.scope, &old.name) else {
            report.violations.push(Violation::RemovedDeclaration {
                item: old.qualified_name(),
            });
            continue;
        };
        let strategy = new.strategy.unwrap_or_else(|| recommend_strategy(false));
        match check_function(old, new, strategy) {
            Ok(FunctionChange::Extended { params, strategy }) => {
                let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
                report.changes.push(format!(
                    "`{}` gained defaulted {} ({:?})",
                    new.qualified_name(),
                    names.join(", "),
                    strategy
                ));
            }
            Ok(FunctionChange::Unchanged) => {}
            Err(violations) => report.extend(violations),
        }
    }

    for new in &current.functions {
        if baseline.function(&new.scope, &new.name).is_none() {
            report
                .changes
                .push(format!("new function `{}`", new.qualified_name()));
        }
    }
}

fn compare_interfaces(baseline: &AbiManifest, current: &AbiManifest, report: &mut CompatReport) {
    for old in &baseline.interfaces {
        let Some(new) = current.interface(&old.name) else {
            report.violations.push(Violation::RemovedDeclaration {
                item: old.scope.qualify(&old.name),
            });
            continue;
        };
        match check_extension(old, new) {
            Ok(0) => {}
            Ok(appended) => report.changes.push(format!(
                "interface `{}` appended {} operation(s)",
                new.name, appended
            )),
            Err(violations) => report.extend(violations),
        }
    }
}

fn compare_enums(
    baseline: &AbiManifest,
    current: &AbiManifest,
    policy: &Policy,
    report: &mut CompatReport,
) {
    for new in &current.enums {
        match baseline.enumeration(&new.name) {
            None => report.extend(validate_enum(new, policy.require_pinned_enum_repr)),
            Some(old) => match check_enum(old, new) {
                Ok(0) => {}
                Ok(appended) => report.changes.push(format!(
                    "enum `{}` appended {} variant(s)",
                    new.qualified_name(),
                    appended
                )),
                Err(violations) => report.extend(
                    violations
                        .into_iter()
                        .filter(|v| {
                            policy.require_pinned_enum_repr
                                || !matches!(v, Violation::UnpinnedEnum { .. })
                        })
                        .collect(),
                ),
            },
        }
    }

    for old in &baseline.enums {
        if current.enumeration(&old.name).is_none() {
            report.violations.push(Violation::RemovedDeclaration {
                item: old.qualified_name(),
            });
        }
    }
}
