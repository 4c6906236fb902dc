//! Evolution rules for a binary library surface.
//!
//! A library's exported surface is captured as an [`AbiManifest`]: records,
//! functions, virtual interfaces, enumerations and inline definitions, each
//! tagged with the [`VersionScope`] it was published in. Comparing the
//! published manifest with the current one yields a [`CompatReport`] listing
//! every change that would break a binary built against the published one.
//!
//! # Rules
//!
//! - Records grow only by appending defaulted fields inside a new scope.
//! - Functions gain parameters only by appending defaulted ones, and the
//!   old-arity symbol stays exported.
//! - Interfaces are append-only once published and immutable once frozen.
//! - Enumerations pin their storage width and only append variants.
//! - Any change to inline code moves it to a new scope name.
//! - Only declared symbols are exported.

pub mod enumeration;
pub mod error;
pub mod function;
pub mod interface;
pub mod manifest;
pub mod odr;
pub mod policy;
pub mod record;
pub mod report;
pub mod scope;
pub mod visibility;

pub use enumeration::{check_enum, validate_enum, EnumDecl, Repr, VariantDecl};
pub use error::{CompatError, FailureMode, Result, Violation};
pub use function::{check_function, recommend_strategy, FunctionChange, FunctionDecl, ParamDecl, Strategy};
pub use interface::{check_extension, ContractState, InterfaceContract, OperationDecl};
pub use manifest::AbiManifest;
pub use odr::{check_inline, BinaryImage, InlineDefinition, ProcessImage};
pub use policy::Policy;
pub use record::{check_record, Conversion, FieldDecl, RecordChange, RecordDecl};
pub use report::{compare, CompatReport};
pub use scope::{ScopeKind, VersionScope};
pub use visibility::check_exports;
