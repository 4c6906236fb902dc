//! The library's description of its own surface.
//!
//! [`current`] is assembled from the record declarations, the interface
//! contract, and the export and inline registries, so it cannot drift from
//! what is actually compiled. [`published_v0`] is the surface as first
//! released; the tests below hold the current surface to it.

use api_updates_core::{
    AbiManifest, CompatError, EnumDecl, FunctionDecl, ParamDecl, Repr, Strategy, VersionScope,
};

use crate::compat;
use crate::export::inline_definitions;
use crate::iface;
use crate::v0::{Mode, DEFAULT_FOO_ARG};
use crate::v1;

pub const LIBRARY: &str = "api-updates";

const PUBLISHED_V0: &str = include_str!("../abi/v0.yaml");

/// The surface as released in `v0`.
pub fn published_v0() -> Result<AbiManifest, CompatError> {
    AbiManifest::from_yaml_str(PUBLISHED_V0)
}

/// The surface this build exports.
pub fn current() -> Result<AbiManifest, CompatError> {
    let mut manifest = AbiManifest::new(LIBRARY);
    manifest.records = vec![
        compat::v0::Params::decl(),
        v1::Params::decl(),
        v1::FooArgs::decl(),
    ];
    manifest.functions = functions();
    manifest.interfaces = vec![iface::contract()?];
    manifest.enums = vec![mode_decl()];
    manifest.inline = inline_definitions();
    Ok(manifest)
}

fn mode_decl() -> EnumDecl {
    Mode::ALL.iter().fold(
        EnumDecl::new("Mode", VersionScope::stable(0), Some(Repr::U32)),
        |decl, mode| decl.variant(mode.name(), *mode as u32 as i64),
    )
}

fn functions() -> Vec<FunctionDecl> {
    let v0 = VersionScope::stable(0);
    let v1 = VersionScope::stable(1);
    let inline = VersionScope::inline(0);
    let status = "c_int";

    vec![
        FunctionDecl::new("init", v0.clone())
            .param(ParamDecl::new("params", "*const v0::Params"))
            .returns(status)
            .symbol("api_v0_init"),
        FunctionDecl::new("init", v1.clone())
            .param(ParamDecl::new("params", "*const v1::Params"))
            .returns(status)
            .symbol("api_v1_init"),
        FunctionDecl::new("foo", v0.clone())
            .param(ParamDecl::new("arg", "i32").with_default(DEFAULT_FOO_ARG.to_string()))
            .symbol("api_v0_foo")
            .symbol("api_v0_foo_arg")
            .strategy(Strategy::Overload),
        FunctionDecl::new("foo", v1)
            .param(ParamDecl::new("args", "*const v1::FooArgs"))
            .returns(status)
            .symbol("api_v1_foo")
            .strategy(Strategy::DefaultedParameter),
        FunctionDecl::new("set_mode", v0.clone())
            .param(ParamDecl::new("mode", "u32"))
            .returns(status)
            .symbol("api_v0_set_mode"),
        FunctionDecl::new("greeting", v0.clone())
            .param(ParamDecl::new("name", "AbiStr"))
            .param(ParamDecl::new("out", "*mut AbiString"))
            .returns(status)
            .symbol("api_v0_greeting"),
        FunctionDecl::new("string_free", v0.clone())
            .param(ParamDecl::new("text", "AbiString"))
            .symbol("api_v0_string_free"),
        FunctionDecl::new("use_values", v0.clone())
            .param(ParamDecl::new("object", "*const ValuesObject"))
            .param(ParamDecl::new("out", "*mut i32"))
            .returns(status)
            .symbol("api_v0_use_values"),
        FunctionDecl::new("values_len", v0.clone())
            .returns("usize")
            .symbol("api_v0_values_len"),
        FunctionDecl::new("internal_new", v0.clone())
            .param(ParamDecl::new("value", "i32"))
            .returns("*mut InternalHandle")
            .symbol("api_v0_internal_new"),
        FunctionDecl::new("internal_get_value", v0.clone())
            .param(ParamDecl::new("handle", "*const InternalHandle"))
            .param(ParamDecl::new("out", "*mut i32"))
            .returns(status)
            .symbol("api_v0_internal_get_value"),
        FunctionDecl::new("internal_clone", v0.clone())
            .param(ParamDecl::new("handle", "*const InternalHandle"))
            .returns("*mut InternalHandle")
            .symbol("api_v0_internal_clone"),
        FunctionDecl::new("internal_share_count", v0.clone())
            .param(ParamDecl::new("handle", "*const InternalHandle"))
            .returns("usize")
            .symbol("api_v0_internal_share_count"),
        FunctionDecl::new("internal_release", v0)
            .param(ParamDecl::new("handle", "*mut InternalHandle"))
            .symbol("api_v0_internal_release"),
        FunctionDecl::new("bar", inline)
            .returns("i32")
            .symbol("api_inline_v0_bar"),
    ]
}
