//! Reference library evolved without breaking binary compatibility.
//!
//! Every published item lives in a version scope that is part of its link
//! name. A binary built against `v0` keeps resolving `api_v0_*` forever,
//! and layout changes land in a new scope with a shim in [`compat`] that
//! forwards the old shape. Code compiled into consumers lives in `inline_*`
//! scopes and is never edited in place.
//!
//! The crate root re-exports the newest revision of each item.

pub mod compat;
pub mod error;
pub mod export;
pub mod iface;
pub mod inline_v0;
pub mod internal;
pub mod manifest;
pub mod observe;
pub mod text;
pub mod v0;
pub mod v1;

pub use libc::{c_int, c_void, size_t};

pub use error::{FfiError, STATUS_OK};
pub use iface::{Values, ValuesObject, ValuesVtable};
pub use inline_v0::{bar, ExposedInternalClass, SomeClass};
pub use internal::InternalHandle;
pub use text::{AbiStr, AbiString};
pub use v0::{foo, foo_arg, greeting, Mode, DEFAULT_FOO_ARG};
pub use v1::{init, FooArgs, Params, DEFAULT_AGE};
