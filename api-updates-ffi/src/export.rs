//! Export table and inline-source registry.
//!
//! Every `#[no_mangle]` entry point registers itself with [`export!`], and
//! every consumer-compiled definition goes through [`inline_item!`], which
//! records its source text. Together they let the library describe its own
//! surface (see [`crate::manifest::current`]).

use api_updates_core::{InlineDefinition, VersionScope};
use tracing::warn;

/// One symbol in the dynamic symbol table.
#[derive(Debug)]
pub struct ExportedSymbol {
    pub symbol: &'static str,
    pub scope: &'static str,
}

impl ExportedSymbol {
    pub const fn new(symbol: &'static str, scope: &'static str) -> Self {
        Self { symbol, scope }
    }
}

inventory::collect!(ExportedSymbol);

/// Source of one inline definition.
#[derive(Debug)]
pub struct InlineSource {
    pub scope: &'static str,
    pub name: &'static str,
    pub body: &'static str,
}

impl InlineSource {
    pub const fn new(scope: &'static str, name: &'static str, body: &'static str) -> Self {
        Self { scope, name, body }
    }
}

inventory::collect!(InlineSource);

/// Register an exported entry point.
macro_rules! export {
    ($symbol:ident, $scope:literal) => {
        ::inventory::submit! {
            $crate::export::ExportedSymbol::new(stringify!($symbol), $scope)
        }
    };
}

/// Emit items and register their source text under `$scope::$name`.
///
/// Items inside must not carry doc comments: only tokens are recorded.
macro_rules! inline_item {
    ($scope:literal, $name:literal, $($item:tt)*) => {
        $($item)*

        ::inventory::submit! {
            $crate::export::InlineSource::new($scope, $name, stringify!($($item)*))
        }
    };
}

pub(crate) use export;
pub(crate) use inline_item;

/// Exported symbols, sorted by name.
pub fn exported_symbols() -> Vec<&'static ExportedSymbol> {
    let mut symbols: Vec<_> = inventory::iter::<ExportedSymbol>.into_iter().collect();
    symbols.sort_by_key(|s| s.symbol);
    symbols
}

/// Registered inline definitions, sorted by symbol.
pub fn inline_definitions() -> Vec<InlineDefinition> {
    let mut definitions: Vec<InlineDefinition> = inventory::iter::<InlineSource>
        .into_iter()
        .filter_map(|source| match source.scope.parse::<VersionScope>() {
            Ok(scope) => Some(InlineDefinition::new(scope, source.name, source.body)),
            Err(e) => {
                warn!(name = source.name, error = %e, "skipping inline source with bad scope");
                None
            }
        })
        .collect();
    definitions.sort_by_key(|d| d.symbol());
    definitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_table_scopes_parse() {
        let symbols = exported_symbols();
        assert!(!symbols.is_empty());
        for s in symbols {
            let scope: VersionScope = s.scope.parse().unwrap();
            assert!(
                s.symbol.starts_with(&format!("api_{}_", scope.name())),
                "{} does not carry its scope {}",
                s.symbol,
                scope
            );
        }
    }

    #[test]
    fn test_export_table_has_no_duplicates() {
        let mut names: Vec<_> = exported_symbols().iter().map(|s| s.symbol).collect();
        let count = names.len();
        names.dedup();
        assert_eq!(names.len(), count);
    }

    #[test]
    fn test_inline_definitions_registered() {
        let symbols: Vec<_> = inline_definitions().iter().map(|d| d.symbol()).collect();
        assert!(symbols.contains(&"inline_v0::bar".to_string()));
        assert!(symbols.contains(&"inline_v0::SomeClass".to_string()));
        assert!(symbols.contains(&"inline_v0::ExposedInternalClass".to_string()));
        assert!(symbols.contains(&"inline_v0::ExposedInternalClass::try_get_value".to_string()));
    }
}
