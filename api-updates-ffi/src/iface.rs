//! The `Values` interface, dispatched across the boundary.
//!
//! The vtable starts with the number of slots the implementing binary was
//! built with. Slots are only ever appended, so a caller reads a slot only
//! when that count covers it and falls back to the documented behavior
//! otherwise. The interface and [`api_v0_use_values`] live in the stable
//! `v0` scope; implementations such as
//! [`SomeClass`](crate::inline_v0::SomeClass) live in inline scopes and can be
//! revised without touching this file.

use std::marker::PhantomData;
use std::ptr;

use api_updates_core::{CompatError, InterfaceContract, OperationDecl, VersionScope};
use libc::{c_int, c_void, size_t};
use memoffset::offset_of;
use static_assertions::const_assert_eq;
use tracing::debug;

use crate::error::{result_to_status, FfiError, STATUS_OK};
use crate::export::export;
use crate::observe::{self, Observation};

pub type ValueFn = unsafe extern "C" fn(this: *const c_void) -> i32;
pub type CombineFn = unsafe extern "C" fn(this: *const c_void, a: i32, b: i32) -> i32;

/// Slots in the first published revision.
pub const VALUES_V0_LEN: usize = 2;
/// Slots in the current revision.
pub const VALUES_LEN: usize = 3;
/// `combine` is the first slot appended after publication.
const COMBINE_SLOT: usize = VALUES_V0_LEN;

#[repr(C)]
pub struct ValuesVtable {
    pub len: size_t,
    pub value_a: ValueFn,
    pub value_b: ValueFn,
    pub combine: CombineFn,
}

// Slot `n` sits right after the length word, one pointer apart.
const_assert_eq!(offset_of!(ValuesVtable, combine), 3 * std::mem::size_of::<usize>());

/// An object as seen by the boundary: a vtable plus an erased receiver.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ValuesObject<'a> {
    pub vtable: *const ValuesVtable,
    pub this: *const c_void,
    _marker: PhantomData<&'a ()>,
}

impl<'a> ValuesObject<'a> {
    pub fn new<T: Values>(value: &'a T) -> Self {
        Self {
            vtable: vtable_of::<T>(),
            this: value as *const T as *const c_void,
            _marker: PhantomData,
        }
    }

    /// Wrap a vtable built by a foreign binary.
    ///
    /// # Safety
    /// `vtable` must declare no more slots than it actually provides, and
    /// `this` must be valid for every operation in it.
    pub unsafe fn from_raw(vtable: *const ValuesVtable, this: *const c_void) -> Self {
        Self {
            vtable,
            this,
            _marker: PhantomData,
        }
    }
}

/// Rust-side view of the interface.
pub trait Values {
    fn value_a(&self) -> i32;
    fn value_b(&self) -> i32;
    /// Appended after publication.
    fn combine(&self, a: i32, b: i32) -> i32 {
        default_combine(a, b)
    }
}

/// What `combine` means for implementations built before it existed.
pub fn default_combine(a: i32, b: i32) -> i32 {
    a.wrapping_add(b)
}

unsafe extern "C" fn value_a_thunk<T: Values>(this: *const c_void) -> i32 {
    (*(this as *const T)).value_a()
}

unsafe extern "C" fn value_b_thunk<T: Values>(this: *const c_void) -> i32 {
    (*(this as *const T)).value_b()
}

unsafe extern "C" fn combine_thunk<T: Values>(this: *const c_void, a: i32, b: i32) -> i32 {
    (*(this as *const T)).combine(a, b)
}

struct VtableOf<T>(PhantomData<T>);

impl<T: Values> VtableOf<T> {
    const VTABLE: ValuesVtable = ValuesVtable {
        len: VALUES_LEN,
        value_a: value_a_thunk::<T>,
        value_b: value_b_thunk::<T>,
        combine: combine_thunk::<T>,
    };
}

/// The current-revision vtable for `T`.
pub fn vtable_of<T: Values>() -> &'static ValuesVtable {
    &VtableOf::<T>::VTABLE
}

/// Outcome of dispatching through a `Values` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub a: i32,
    pub b: i32,
    pub combined: i32,
}

/// Dispatch every operation the object's vtable covers.
///
/// # Safety
/// See [`ValuesObject::from_raw`].
pub unsafe fn use_values(object: &ValuesObject<'_>) -> Result<Dispatch, FfiError> {
    if object.vtable.is_null() {
        return Err(FfiError::NullPointer("vtable"));
    }
    let vtable = object.vtable;
    let len = ptr::addr_of!((*vtable).len).read();
    if len < VALUES_V0_LEN {
        return Err(FfiError::TruncatedVtable(len));
    }

    let a = (ptr::addr_of!((*vtable).value_a).read())(object.this);
    let b = (ptr::addr_of!((*vtable).value_b).read())(object.this);
    let combined = if len > COMBINE_SLOT {
        (ptr::addr_of!((*vtable).combine).read())(object.this, a, b)
    } else {
        debug!(len, "vtable predates `combine`; using default");
        default_combine(a, b)
    };

    let dispatch = Dispatch { a, b, combined };
    observe::record(Observation::UseValues { a, b, combined });
    Ok(dispatch)
}

/// # Safety
/// `object` must be null or point to a valid [`ValuesObject`]; `out` must be
/// null or writable.
#[no_mangle]
pub unsafe extern "C" fn api_v0_use_values(object: *const ValuesObject<'_>, out: *mut i32) -> c_int {
    let Some(object) = object.as_ref() else {
        return result_to_status::<()>(Err(FfiError::NullPointer("object")));
    };
    match use_values(object) {
        Ok(dispatch) => {
            if !out.is_null() {
                out.write(dispatch.combined);
            }
            STATUS_OK
        }
        Err(e) => result_to_status::<()>(Err(e)),
    }
}
export!(api_v0_use_values, "v0");

/// Slot count this library dispatches. A binary built against a larger
/// count must not assume its extra slots are used.
#[no_mangle]
pub extern "C" fn api_v0_values_len() -> size_t {
    VALUES_LEN
}
export!(api_v0_values_len, "v0");

/// The published contract for `Values`.
pub fn contract() -> Result<InterfaceContract, CompatError> {
    let mut contract = InterfaceContract::draft("Values", VersionScope::stable(0));
    contract.push_operation(OperationDecl::new("value_a", "fn(*const c_void) -> i32"))?;
    contract.push_operation(OperationDecl::new("value_b", "fn(*const c_void) -> i32"))?;
    contract.publish()?;
    contract.push_operation(OperationDecl::new(
        "combine",
        "fn(*const c_void, i32, i32) -> i32",
    ))?;
    Ok(contract)
}
