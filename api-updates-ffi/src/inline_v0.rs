//! Scope `inline_v0`: code compiled into the consumer.
//!
//! Everything here is duplicated into each binary that uses it, so a change
//! to any body must land in a new `inline_vN` scope. Editing in place gives
//! two binaries in one process different definitions under one name. The
//! bodies are registered with [`inline_item!`] and fingerprinted when the
//! library describes itself.

use crate::error::{FfiError, STATUS_OK};
use crate::export::{export, inline_item};
use crate::iface::{Values, ValuesObject};
use crate::internal::{
    api_v0_internal_clone, api_v0_internal_get_value, api_v0_internal_new,
    api_v0_internal_release, api_v0_internal_share_count, InternalHandle,
};

inline_item! { "inline_v0", "bar",
    #[inline]
    pub fn bar() -> i32 {
        10
    }
}

/// Out-of-line copy of [`bar`] for callers that cannot inline.
#[no_mangle]
pub extern "C" fn api_inline_v0_bar() -> i32 {
    bar()
}
export!(api_inline_v0_bar, "inline_v0");

inline_item! { "inline_v0", "SomeClass",
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SomeClass {
        pub a: i32,
        pub b: i32,
    }

    impl SomeClass {
        pub fn new(a: i32, b: i32) -> Self {
            Self { a, b }
        }

        pub fn as_object(&self) -> ValuesObject<'_> {
            ValuesObject::new(self)
        }
    }

    impl Values for SomeClass {
        fn value_a(&self) -> i32 {
            self.a
        }

        fn value_b(&self) -> i32 {
            self.b
        }

        fn combine(&self, a: i32, b: i32) -> i32 {
            a.wrapping_mul(b)
        }
    }
}

inline_item! { "inline_v0", "ExposedInternalClass",
    #[derive(Debug)]
    pub struct ExposedInternalClass {
        handle: *mut InternalHandle,
    }

    impl ExposedInternalClass {
        pub fn new(value: i32) -> Self {
            Self {
                handle: api_v0_internal_new(value),
            }
        }

        pub fn get_value(&self) -> i32 {
            let mut value = 0;
            unsafe { api_v0_internal_get_value(self.handle, &mut value) };
            value
        }

        pub fn share_count(&self) -> usize {
            unsafe { api_v0_internal_share_count(self.handle) }
        }
    }

    impl Clone for ExposedInternalClass {
        fn clone(&self) -> Self {
            Self {
                handle: unsafe { api_v0_internal_clone(self.handle) },
            }
        }
    }

    impl Drop for ExposedInternalClass {
        fn drop(&mut self) {
            unsafe { api_v0_internal_release(self.handle) }
        }
    }
}

// `get_value` above is published as is; callers that need the status use
// this accessor instead.
inline_item! { "inline_v0", "ExposedInternalClass::try_get_value",
    impl ExposedInternalClass {
        pub fn try_get_value(&self) -> Result<i32, FfiError> {
            let mut value = 0;
            match unsafe { api_v0_internal_get_value(self.handle, &mut value) } {
                STATUS_OK => Ok(value),
                _ => Err(FfiError::NullPointer("handle")),
            }
        }
    }
}
