//! End-to-end run of the reference library.
//!
//! Drives every exported entry point the way an old binary and a recompiled
//! binary would, and optionally checks the current surface against a
//! published manifest.

use std::path::Path;

use api_updates_core::{check_exports, compare, AbiManifest, CompatError, CompatReport, Policy};
use api_updates_ffi::compat::v0 as old;
use api_updates_ffi::export::exported_symbols;
use api_updates_ffi::iface::api_v0_use_values;
use api_updates_ffi::inline_v0::api_inline_v0_bar;
use api_updates_ffi::internal::{api_v0_internal_get_value, api_v0_internal_new, api_v0_internal_release};
use api_updates_ffi::observe::{self, Observation};
use api_updates_ffi::text::{api_v0_string_free, encode};
use api_updates_ffi::v0::{api_v0_foo, api_v0_greeting};
use api_updates_ffi::v1::{api_v1_foo, api_v1_init};
use api_updates_ffi::{
    manifest, c_int, AbiStr, AbiString, ExposedInternalClass, Params, SomeClass, STATUS_OK,
};
use tracing::{info, warn};

use crate::config::{Config, DemoConfig};

/// Demo failures.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("`{call}` returned status {status}")]
    Status { call: &'static str, status: c_int },

    #[error(transparent)]
    Ffi(#[from] api_updates_ffi::FfiError),

    #[error(transparent)]
    Compat(#[from] CompatError),
}

fn check(call: &'static str, status: c_int) -> Result<(), DemoError> {
    if status == STATUS_OK {
        Ok(())
    } else {
        Err(DemoError::Status { call, status })
    }
}

/// What the demo observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoOutcome {
    pub greeting: String,
    pub bar: i32,
    pub combined: i32,
    pub internal_direct: i32,
    pub internal_wrapped: i32,
    /// Everything the callees saw, in call order.
    pub observations: Vec<Observation>,
}

/// Call every entry point with the configured inputs.
pub fn run(demo: &DemoConfig) -> Result<DemoOutcome, DemoError> {
    let name = encode(&demo.name);
    observe::take();

    // Old binary: v0 record through the shim, zero-argument foo.
    let params = old::Params {
        name: AbiStr::from(name.as_slice()),
    };
    check("api_v0_init", unsafe { old::api_v0_init(&params) })?;
    api_v0_foo();

    // Recompiled binary: v1 record, argument block left to defaults.
    let params = Params::new(AbiStr::from(name.as_slice()));
    check("api_v1_init", unsafe { api_v1_init(&params) })?;
    check("api_v1_foo", unsafe { api_v1_foo(std::ptr::null()) })?;

    let mut text = AbiString::empty();
    check("api_v0_greeting", unsafe {
        api_v0_greeting(AbiStr::from(name.as_slice()), &mut text)
    })?;
    let greeting = text.decode()?;
    api_v0_string_free(text);

    let bar = api_inline_v0_bar();

    let some_class = SomeClass::new(demo.some_class_a, demo.some_class_b);
    let mut combined = 0;
    check("api_v0_use_values", unsafe {
        api_v0_use_values(&some_class.as_object(), &mut combined)
    })?;

    let handle = api_v0_internal_new(demo.internal_value);
    let mut internal_direct = 0;
    let status = unsafe { api_v0_internal_get_value(handle, &mut internal_direct) };
    unsafe { api_v0_internal_release(handle) };
    check("api_v0_internal_get_value", status)?;

    let internal_wrapped = ExposedInternalClass::new(demo.internal_value).get_value();

    let outcome = DemoOutcome {
        greeting,
        bar,
        combined,
        internal_direct,
        internal_wrapped,
        observations: observe::take(),
    };
    info!(
        greeting = %outcome.greeting,
        bar = outcome.bar,
        combined = outcome.combined,
        internal = outcome.internal_direct,
        "demo complete"
    );
    Ok(outcome)
}

/// Compare the library's current surface with `baseline`.
///
/// The export table is checked against the current manifest as well, so an
/// undeclared or missing symbol shows up in the same report.
pub fn check_against(baseline: &AbiManifest, policy: &Policy) -> Result<CompatReport, DemoError> {
    let current = manifest::current()?;
    let mut report = compare(baseline, &current, policy);
    let exported: Vec<&str> = exported_symbols().iter().map(|s| s.symbol).collect();
    report
        .violations
        .extend(check_exports(&current, exported, policy));
    if !report.is_compatible() {
        warn!(violations = report.violations.len(), "surface is not compatible with baseline");
    }
    Ok(report)
}

/// Run the compatibility check configured in `config`, if any.
pub fn check_configured(config: &Config, base: &Path) -> Result<Option<CompatReport>, DemoError> {
    let Some(path) = config.baseline_path(base) else {
        return Ok(None);
    };
    let baseline = AbiManifest::load(&path)?;
    check_against(&baseline, &config.policy).map(Some)
}
