//! Shims for superseded scopes.
//!
//! This is the only place the old shapes are spelled out. Each shim rebuilds
//! the current shape from the old one, fills fields the old shape lacks with
//! their documented defaults, and forwards to the current entry point. The
//! crate root never re-exports anything from here.

pub mod v0 {
    use api_updates_core::{FieldDecl, RecordDecl, VersionScope};
    use libc::c_int;

    use crate::error::{result_to_status, FfiError};
    use crate::export::export;
    use crate::text::AbiStr;
    use crate::v1;

    /// `Params` as published in `v0`.
    #[repr(C)]
    #[derive(Debug, Clone, Copy)]
    pub struct Params<'a> {
        pub name: AbiStr<'a>,
    }

    impl<'a> Params<'a> {
        pub fn decl() -> RecordDecl {
            RecordDecl::new(
                "Params",
                VersionScope::stable(0),
                vec![FieldDecl::new("name", "AbiStr")],
            )
        }
    }

    impl<'a> From<Params<'a>> for v1::Params<'a> {
        fn from(old: Params<'a>) -> Self {
            v1::Params {
                name: old.name,
                age: v1::DEFAULT_AGE,
            }
        }
    }

    /// # Safety
    /// `params` must be null or point to a valid `v0::Params`.
    #[no_mangle]
    pub unsafe extern "C" fn api_v0_init(params: *const Params<'_>) -> c_int {
        let Some(old) = params.as_ref() else {
            return result_to_status::<()>(Err(FfiError::NullPointer("params")));
        };
        let current = v1::Params::from(*old);
        v1::api_v1_init(&current)
    }
    export!(api_v0_init, "v0");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{self, Observation};
    use crate::text::{encode, AbiStr};
    use crate::v1;

    #[test]
    fn test_old_params_reach_new_init_with_default_age() {
        let name = encode("John");
        let old = v0::Params {
            name: AbiStr::from(name.as_slice()),
        };
        observe::take();
        assert_eq!(unsafe { v0::api_v0_init(&old) }, 0);
        assert_eq!(
            observe::last(),
            Some(Observation::Init {
                name: "John".into(),
                age: 10
            })
        );
    }

    #[test]
    fn test_conversion_matches_record_decl_default() {
        let new = v1::Params::from(v0::Params {
            name: AbiStr::empty(),
        });
        let decl = v1::Params::decl();
        let default = decl.field("age").and_then(|f| f.default.clone()).unwrap();
        assert_eq!(new.age.to_string(), default);
    }

    #[test]
    fn test_null_params() {
        assert_eq!(unsafe { v0::api_v0_init(std::ptr::null()) }, -1);
    }
}
