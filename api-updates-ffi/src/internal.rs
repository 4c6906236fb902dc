//! Opaque handles to library-internal state.
//!
//! `InternalClass` never crosses the boundary. Callers hold a pointer to an
//! [`InternalHandle`] whose layout they cannot see and reach the state only
//! through the `api_v0_internal_*` functions, so the class can grow or
//! reorder fields without breaking anyone.

use std::ptr;
use std::sync::Arc;

use libc::{c_int, size_t};
use tracing::trace;

use crate::error::{result_to_status, FfiError, STATUS_OK};
use crate::export::export;

#[derive(Debug)]
pub(crate) struct InternalClass {
    value: i32,
}

impl InternalClass {
    pub(crate) fn new(value: i32) -> Self {
        Self { value }
    }

    pub(crate) fn get_value(&self) -> i32 {
        self.value
    }
}

/// Shared ownership of an [`InternalClass`]. Opaque to callers.
#[derive(Debug, Clone)]
pub struct InternalHandle {
    inner: Arc<InternalClass>,
}

impl InternalHandle {
    pub fn new(value: i32) -> Self {
        Self {
            inner: Arc::new(InternalClass::new(value)),
        }
    }

    pub fn get_value(&self) -> i32 {
        self.inner.get_value()
    }

    /// Handles currently sharing the same instance.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    fn into_raw(self) -> *mut InternalHandle {
        Box::into_raw(Box::new(self))
    }
}

#[no_mangle]
pub extern "C" fn api_v0_internal_new(value: i32) -> *mut InternalHandle {
    trace!(value, "internal handle created");
    InternalHandle::new(value).into_raw()
}
export!(api_v0_internal_new, "v0");

/// # Safety
/// `handle` must be null or a live handle from this library; `out` must be
/// null or writable.
#[no_mangle]
pub unsafe extern "C" fn api_v0_internal_get_value(
    handle: *const InternalHandle,
    out: *mut i32,
) -> c_int {
    let Some(handle) = handle.as_ref() else {
        return result_to_status::<()>(Err(FfiError::NullPointer("handle")));
    };
    if out.is_null() {
        return result_to_status::<()>(Err(FfiError::NullPointer("out")));
    }
    out.write(handle.get_value());
    STATUS_OK
}
export!(api_v0_internal_get_value, "v0");

/// A second handle to the same instance, or null for a null handle.
///
/// # Safety
/// `handle` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn api_v0_internal_clone(handle: *const InternalHandle) -> *mut InternalHandle {
    match handle.as_ref() {
        Some(handle) => handle.clone().into_raw(),
        None => ptr::null_mut(),
    }
}
export!(api_v0_internal_clone, "v0");

/// # Safety
/// `handle` must be null or a live handle from this library.
#[no_mangle]
pub unsafe extern "C" fn api_v0_internal_share_count(handle: *const InternalHandle) -> size_t {
    handle.as_ref().map_or(0, InternalHandle::share_count)
}
export!(api_v0_internal_share_count, "v0");

/// Release one handle. The instance is destroyed with its last handle.
///
/// # Safety
/// `handle` must be null or a live handle from this library, and must not
/// be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn api_v0_internal_release(handle: *mut InternalHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}
export!(api_v0_internal_release, "v0");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_lifecycle() {
        unsafe {
            let handle = api_v0_internal_new(25);
            let mut out = 0;
            assert_eq!(api_v0_internal_get_value(handle, &mut out), STATUS_OK);
            assert_eq!(out, 25);

            let second = api_v0_internal_clone(handle);
            assert_eq!(api_v0_internal_share_count(handle), 2);
            api_v0_internal_release(handle);
            assert_eq!(api_v0_internal_share_count(second), 1);

            assert_eq!(api_v0_internal_get_value(second, &mut out), STATUS_OK);
            assert_eq!(out, 25);
            api_v0_internal_release(second);
        }
    }

    #[test]
    fn test_null_handles() {
        unsafe {
            let mut out = 0;
            assert_eq!(api_v0_internal_get_value(ptr::null(), &mut out), -1);
            assert!(api_v0_internal_clone(ptr::null()).is_null());
            assert_eq!(api_v0_internal_share_count(ptr::null()), 0);
            api_v0_internal_release(ptr::null_mut());
        }
    }

    #[test]
    fn test_null_out() {
        unsafe {
            let handle = api_v0_internal_new(1);
            assert_eq!(api_v0_internal_get_value(handle, ptr::null_mut()), -1);
            api_v0_internal_release(handle);
        }
    }
}
