//! Scope `v0`: the first published surface.
//!
//! Nothing here changes layout or link name again. `foo` gained a parameter
//! after publication through an overload: `api_v0_foo` still exists and
//! delegates to `api_v0_foo_arg` with [`DEFAULT_FOO_ARG`].

use libc::c_int;
use tracing::info;

use crate::error::{result_to_status, FfiError, STATUS_OK};
use crate::export::export;
use crate::observe::{self, Observation};
use crate::text::{AbiStr, AbiString};

/// Argument `foo` behaved as if it received before it took one.
pub const DEFAULT_FOO_ARG: i32 = 0;

pub fn foo() {
    foo_arg(DEFAULT_FOO_ARG);
}

pub fn foo_arg(arg: i32) {
    info!(arg, "hello from foo");
    observe::record(Observation::Foo { arg });
}

/// Old-arity entry point. Its link name must never change.
#[no_mangle]
pub extern "C" fn api_v0_foo() {
    foo();
}
export!(api_v0_foo, "v0");

#[no_mangle]
pub extern "C" fn api_v0_foo_arg(arg: i32) {
    foo_arg(arg);
}
export!(api_v0_foo_arg, "v0");

/// Output verbosity. Storage is pinned to `u32`; variants are only appended.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Quiet = 0,
    Verbose = 1,
    // appended after v0 was published
    Trace = 2,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Quiet, Mode::Verbose, Mode::Trace];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Quiet => "quiet",
            Mode::Verbose => "verbose",
            Mode::Trace => "trace",
        }
    }
}

impl TryFrom<u32> for Mode {
    type Error = FfiError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Quiet),
            1 => Ok(Mode::Verbose),
            2 => Ok(Mode::Trace),
            _ => Err(FfiError::UnknownDiscriminant { ty: "mode", value }),
        }
    }
}

pub fn set_mode(mode: Mode) {
    info!(mode = mode.name(), "mode set");
    observe::record(Observation::Mode { mode });
}

/// Modes travel as raw `u32`; unknown values are rejected, never cast.
#[no_mangle]
pub extern "C" fn api_v0_set_mode(mode: u32) -> c_int {
    result_to_status(Mode::try_from(mode).map(set_mode))
}
export!(api_v0_set_mode, "v0");

pub fn greeting(name: &str) -> String {
    format!("hello, {}", name)
}

/// Write a greeting for `name` into `out`.
///
/// # Safety
/// `name` must describe readable memory; `out` must be null or writable.
/// The returned text must be released with `api_v0_string_free`.
#[no_mangle]
pub unsafe extern "C" fn api_v0_greeting(name: AbiStr<'_>, out: *mut AbiString) -> c_int {
    if out.is_null() {
        return result_to_status::<()>(Err(FfiError::NullPointer("out")));
    }
    match name.decode() {
        Ok(name) => {
            out.write(AbiString::encode(&greeting(&name)));
            STATUS_OK
        }
        Err(e) => {
            out.write(AbiString::empty());
            result_to_status::<()>(Err(e))
        }
    }
}
export!(api_v0_greeting, "v0");
