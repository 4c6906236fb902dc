//! Scope `v1`.
//!
//! `Params` gained `age`, which changed its layout, so the record and the
//! function consuming it moved here. Binaries built against `v0` still call
//! `api_v0_init`, served by [`crate::compat::v0`].
//!
//! `api_v1_foo` is the defaulted-parameter form of `foo`: arguments travel in
//! a size-prefixed block and any field beyond the caller's declared size
//! takes its default.

use std::mem::size_of;
use std::ptr;

use api_updates_core::{FieldDecl, RecordDecl, VersionScope};
use libc::c_int;
use memoffset::offset_of;
use tracing::info;

use crate::error::{result_to_status, FfiError, STATUS_OK};
use crate::export::export;
use crate::observe::{self, Observation};
use crate::text::AbiStr;
use crate::v0::{foo_arg, DEFAULT_FOO_ARG};

/// Age assumed for callers built before `age` existed.
pub const DEFAULT_AGE: i32 = 10;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    pub name: AbiStr<'a>,
    pub age: i32,
}

impl<'a> Params<'a> {
    pub fn new(name: AbiStr<'a>) -> Self {
        Self {
            name,
            age: DEFAULT_AGE,
        }
    }

    pub fn with_age(mut self, age: i32) -> Self {
        self.age = age;
        self
    }

    pub fn decl() -> RecordDecl {
        RecordDecl::new(
            "Params",
            VersionScope::stable(1),
            vec![
                FieldDecl::new("name", "AbiStr"),
                FieldDecl::new("age", "i32").with_default(DEFAULT_AGE.to_string()),
            ],
        )
    }
}

pub fn init(params: &Params<'_>) -> Result<(), FfiError> {
    let name = params.name.decode()?;
    info!(name = %name, age = params.age, "hello from init");
    observe::record(Observation::Init {
        name,
        age: params.age,
    });
    Ok(())
}

/// # Safety
/// `params` must be null or point to a valid `v1::Params`.
#[no_mangle]
pub unsafe extern "C" fn api_v1_init(params: *const Params<'_>) -> c_int {
    match params.as_ref() {
        Some(params) => result_to_status(init(params)),
        None => result_to_status::<()>(Err(FfiError::NullPointer("params"))),
    }
}
export!(api_v1_init, "v1");

/// Size-prefixed argument block for `api_v1_foo`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FooArgs {
    /// Bytes of this block the caller knew about when it was built.
    pub size: u32,
    pub arg: i32,
}

/// Size of the block's header.
pub const FOO_ARGS_HEADER: u32 = size_of::<u32>() as u32;

impl FooArgs {
    pub const fn new(arg: i32) -> Self {
        Self {
            size: size_of::<Self>() as u32,
            arg,
        }
    }

    /// A block from a caller that supplied no arguments at all.
    pub const fn header_only() -> Self {
        Self {
            size: FOO_ARGS_HEADER,
            arg: DEFAULT_FOO_ARG,
        }
    }

    pub fn decl() -> RecordDecl {
        RecordDecl::new(
            "FooArgs",
            VersionScope::stable(1),
            vec![
                FieldDecl::new("size", "u32"),
                FieldDecl::new("arg", "i32").with_default(DEFAULT_FOO_ARG.to_string()),
            ],
        )
    }

    /// Read the argument, defaulting every field the caller did not cover.
    ///
    /// A null block means every argument was omitted.
    ///
    /// # Safety
    /// `args` must be null or valid for reads of the size it declares.
    pub unsafe fn resolve(args: *const FooArgs) -> Result<i32, FfiError> {
        if args.is_null() {
            return Ok(DEFAULT_FOO_ARG);
        }
        let size = ptr::addr_of!((*args).size).read();
        if size < FOO_ARGS_HEADER {
            return Err(FfiError::TruncatedArgs(size));
        }
        let arg_end = offset_of!(FooArgs, arg) + size_of::<i32>();
        if size as usize >= arg_end {
            Ok(ptr::addr_of!((*args).arg).read())
        } else {
            Ok(DEFAULT_FOO_ARG)
        }
    }
}

impl Default for FooArgs {
    fn default() -> Self {
        Self::new(DEFAULT_FOO_ARG)
    }
}

/// # Safety
/// See [`FooArgs::resolve`].
#[no_mangle]
pub unsafe extern "C" fn api_v1_foo(args: *const FooArgs) -> c_int {
    match FooArgs::resolve(args) {
        Ok(arg) => {
            foo_arg(arg);
            STATUS_OK
        }
        Err(e) => result_to_status::<()>(Err(e)),
    }
}
export!(api_v1_foo, "v1");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::encode;

    #[test]
    fn test_init_observes_fields() {
        let name = encode("Ada");
        let params = Params::new(AbiStr::from(name.as_slice())).with_age(36);
        observe::take();
        assert_eq!(unsafe { api_v1_init(&params) }, STATUS_OK);
        assert_eq!(
            observe::last(),
            Some(Observation::Init {
                name: "Ada".into(),
                age: 36
            })
        );
    }

    #[test]
    fn test_init_null() {
        assert_eq!(unsafe { api_v1_init(std::ptr::null()) }, -1);
    }

    #[test]
    fn test_init_invalid_text() {
        let bytes = [0xffu8];
        let params = Params::new(AbiStr::from(&bytes[..]));
        assert_eq!(unsafe { api_v1_init(&params) }, -2);
    }

    #[test]
    fn test_foo_args_resolution() {
        unsafe {
            assert_eq!(FooArgs::resolve(std::ptr::null()), Ok(DEFAULT_FOO_ARG));
            assert_eq!(FooArgs::resolve(&FooArgs::header_only()), Ok(DEFAULT_FOO_ARG));
            assert_eq!(FooArgs::resolve(&FooArgs::new(42)), Ok(42));
            assert_eq!(FooArgs::resolve(&FooArgs::default()), Ok(DEFAULT_FOO_ARG));
        }
    }

    #[test]
    fn test_truncated_block() {
        let args = FooArgs { size: 2, arg: 7 };
        assert_eq!(unsafe { FooArgs::resolve(&args) }, Err(FfiError::TruncatedArgs(2)));
        assert_eq!(unsafe { api_v1_foo(&args) }, -4);
    }

    #[test]
    fn test_old_header_reads_only_what_it_declares() {
        // A caller built before `arg` existed only allocates the header.
        let header: u32 = FOO_ARGS_HEADER;
        let args = &header as *const u32 as *const FooArgs;
        assert_eq!(unsafe { FooArgs::resolve(args) }, Ok(DEFAULT_FOO_ARG));
    }

    #[test]
    fn test_omitted_argument_matches_old_arity() {
        observe::take();
        crate::v0::api_v0_foo();
        unsafe {
            api_v1_foo(std::ptr::null());
            api_v1_foo(&FooArgs::header_only());
        }
        let seen = observe::take();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|o| *o == Observation::Foo { arg: 0 }));
    }
}
