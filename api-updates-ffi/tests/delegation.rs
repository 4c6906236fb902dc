//! Old entry points must behave exactly like the new ones with defaults.

use api_updates_ffi::compat;
use api_updates_ffi::observe::{self, Observation};
use api_updates_ffi::text::encode;
use api_updates_ffi::v0::{api_v0_foo, api_v0_foo_arg};
use api_updates_ffi::v1::{api_v1_foo, api_v1_init};
use api_updates_ffi::{
    AbiStr, ExposedInternalClass, FooArgs, Params, SomeClass, ValuesObject, ValuesVtable,
    DEFAULT_AGE, DEFAULT_FOO_ARG, STATUS_OK,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_old_init_equals_new_init_with_default(name in "[A-Za-z ]{0,24}") {
        let bytes = encode(&name);

        observe::take();
        let old = compat::v0::Params { name: AbiStr::from(bytes.as_slice()) };
        let old_status = unsafe { compat::v0::api_v0_init(&old) };
        let new = Params::new(AbiStr::from(bytes.as_slice())).with_age(DEFAULT_AGE);
        let new_status = unsafe { api_v1_init(&new) };
        let seen = observe::take();

        prop_assert_eq!(old_status, STATUS_OK);
        prop_assert_eq!(new_status, STATUS_OK);
        prop_assert_eq!(seen.len(), 2);
        prop_assert_eq!(&seen[0], &seen[1]);
        prop_assert_eq!(&seen[0], &Observation::Init { name, age: DEFAULT_AGE });
    }

    #[test]
    fn prop_explicit_arg_reaches_every_form(arg in any::<i32>()) {
        observe::take();
        api_v0_foo_arg(arg);
        let status = unsafe { api_v1_foo(&FooArgs::new(arg)) };
        let seen = observe::take();

        prop_assert_eq!(status, STATUS_OK);
        prop_assert_eq!(seen, vec![Observation::Foo { arg }, Observation::Foo { arg }]);
    }

    #[test]
    fn prop_some_class_combines(a in -1000i32..1000, b in -1000i32..1000) {
        let object = SomeClass::new(a, b);
        let mut out = 0;
        let status = unsafe { api_updates_ffi::iface::api_v0_use_values(&object.as_object(), &mut out) };
        prop_assert_eq!(status, STATUS_OK);
        prop_assert_eq!(out, a * b);
    }
}

#[test]
fn test_omitted_arg_is_identical_everywhere() {
    observe::take();
    api_v0_foo();
    api_v0_foo_arg(DEFAULT_FOO_ARG);
    unsafe {
        api_v1_foo(std::ptr::null());
        api_v1_foo(&FooArgs::header_only());
    }
    let seen = observe::take();
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|o| *o == Observation::Foo { arg: DEFAULT_FOO_ARG }));
}

/// A caller built against the first revision of `Values` only fills two slots.
#[test]
fn test_old_vtable_gets_default_combine() {
    #[repr(C)]
    struct ValuesVtableV0 {
        len: usize,
        value_a: unsafe extern "C" fn(*const std::ffi::c_void) -> i32,
        value_b: unsafe extern "C" fn(*const std::ffi::c_void) -> i32,
    }

    unsafe extern "C" fn three(_: *const std::ffi::c_void) -> i32 {
        3
    }
    unsafe extern "C" fn four(_: *const std::ffi::c_void) -> i32 {
        4
    }

    let old = ValuesVtableV0 {
        len: 2,
        value_a: three,
        value_b: four,
    };
    let object = unsafe {
        ValuesObject::from_raw(
            &old as *const ValuesVtableV0 as *const ValuesVtable,
            std::ptr::null(),
        )
    };

    observe::take();
    let mut out = 0;
    assert_eq!(
        unsafe { api_updates_ffi::iface::api_v0_use_values(&object, &mut out) },
        STATUS_OK
    );
    assert_eq!(out, 7);
    assert_eq!(
        observe::last(),
        Some(Observation::UseValues { a: 3, b: 4, combined: 7 })
    );
}

#[test]
fn test_handle_survives_original_owner() {
    let clone = {
        let original = ExposedInternalClass::new(25);
        original.clone()
    };
    assert_eq!(clone.get_value(), 25);
    assert_eq!(clone.share_count(), 1);
}
