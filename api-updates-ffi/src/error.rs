//! Boundary error codes.
//!
//! Exported functions report failures as negative status codes, the way a C
//! caller expects. Inside the crate they are ordinary `Result`s.

use libc::c_int;
use tracing::warn;

/// Success.
pub const STATUS_OK: c_int = 0;

/// Failures detected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FfiError {
    #[error("null pointer passed for `{0}`")]
    NullPointer(&'static str),

    #[error("text is not valid in the boundary representation")]
    InvalidText,

    #[error("unknown discriminant {value} for `{ty}`")]
    UnknownDiscriminant { ty: &'static str, value: u32 },

    #[error("argument block of {0} bytes is shorter than its header")]
    TruncatedArgs(u32),

    #[error("vtable declares {0} operations, fewer than the first published revision")]
    TruncatedVtable(usize),
}

impl FfiError {
    /// Negative status code reported to C callers.
    pub fn status(self) -> c_int {
        match self {
            FfiError::NullPointer(_) => -1,
            FfiError::InvalidText => -2,
            FfiError::UnknownDiscriminant { .. } => -3,
            FfiError::TruncatedArgs(_) => -4,
            FfiError::TruncatedVtable(_) => -5,
        }
    }
}

/// Convert a result to a status code, logging the failure.
pub fn result_to_status<T>(result: Result<T, FfiError>) -> c_int {
    match result {
        Ok(_) => STATUS_OK,
        Err(e) => {
            warn!(error = %e, status = e.status(), "call rejected at the boundary");
            e.status()
        }
    }
}
