//! Exported symbol table.
//!
//! Only declared symbols may be visible to the dynamic loader. Anything else
//! can take part in cross-binary resolution and collide with, or override, a
//! definition in another binary.

use std::collections::BTreeSet;

use tracing::warn;

use crate::error::Violation;
use crate::manifest::AbiManifest;
use crate::policy::Policy;

/// Compare a binary's exported symbols with what its manifest declares.
pub fn check_exports<'a, I>(manifest: &AbiManifest, exported: I, policy: &Policy) -> Vec<Violation>
where
    I: IntoIterator<Item = &'a str>,
{
    let declared = manifest.declared_symbols();
    let exported: BTreeSet<&str> = exported.into_iter().collect();

    let mut violations = Vec::new();
    if !policy.allow_unlisted_exports {
        for symbol in exported.iter().filter(|s| !declared.contains(**s)) {
            warn!(symbol = %symbol, library = %manifest.library, "undeclared export");
            violations.push(Violation::UnintendedExport {
                symbol: symbol.to_string(),
            });
        }
    }
    for symbol in declared.iter().filter(|s| !exported.contains(s.as_str())) {
        warn!(symbol = %symbol, library = %manifest.library, "declared symbol is not exported");
        violations.push(Violation::MissingSymbol {
            symbol: symbol.clone(),
        });
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::FunctionDecl;
    use crate::scope::VersionScope;

    fn manifest() -> AbiManifest {
        AbiManifest {
            library: "api".into(),
            functions: vec![FunctionDecl::new("foo", VersionScope::stable(0))
                .symbol("api_v0_foo")
                .symbol("api_v0_foo_arg")],
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_match() {
        let violations = check_exports(&manifest(), ["api_v0_foo", "api_v0_foo_arg"], &Policy::default());
        assert!(violations.is_empty());
    }

    #[test]
    fn test_internal_symbol_leaked() {
        let violations = check_exports(
            &manifest(),
            ["api_v0_foo", "api_v0_foo_arg", "internal_helper"],
            &Policy::default(),
        );
        assert_eq!(
            violations,
            vec![Violation::UnintendedExport {
                symbol: "internal_helper".into()
            }]
        );
    }

    #[test]
    fn test_leak_tolerated_by_policy() {
        let policy = Policy {
            allow_unlisted_exports: true,
            ..Policy::default()
        };
        let violations = check_exports(
            &manifest(),
            ["api_v0_foo", "api_v0_foo_arg", "internal_helper"],
            &policy,
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_missing_symbol() {
        let violations = check_exports(&manifest(), ["api_v0_foo"], &Policy::default());
        assert_eq!(
            violations,
            vec![Violation::MissingSymbol {
                symbol: "api_v0_foo_arg".into()
            }]
        );
    }
}
