//! Evolution interface step definitions.
//!
//! Observations are recorded per thread, so every step that calls into the
//! library drains the log within the same step.

use std::ffi::c_void;

use api_updates_core::{
    check_enum, compare, AbiManifest, BinaryImage, CompatReport, EnumDecl, InlineDefinition,
    Policy, ProcessImage, VersionScope, Violation,
};
use api_updates_ffi::compat::v0 as old;
use api_updates_ffi::iface::api_v0_use_values;
use api_updates_ffi::internal::{
    api_v0_internal_get_value, api_v0_internal_new, api_v0_internal_release,
};
use api_updates_ffi::manifest;
use api_updates_ffi::observe::{self, Observation};
use api_updates_ffi::text::encode;
use api_updates_ffi::v0::api_v0_foo;
use api_updates_ffi::v1::{api_v1_foo, api_v1_init};
use api_updates_ffi::{
    AbiStr, ExposedInternalClass, FooArgs, Params, SomeClass, ValuesObject, ValuesVtable,
    STATUS_OK,
};
use cucumber::{given, then, when, World};

/// Which surface the simulated caller was compiled against.
#[derive(Debug, Clone)]
enum Caller {
    V0 { name: String },
    V1 { name: String, age: i32 },
}

/// An object handed to the library for dispatch.
#[derive(Debug, Clone)]
enum Implementation {
    /// Built by a foreign binary against `operations` slots.
    Foreign { operations: usize, a: i32, b: i32 },
    Current(SomeClass),
}

/// Test context for evolution scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct EvolutionWorld {
    caller: Option<Caller>,
    observations: Vec<Observation>,
    internal_value: i32,
    implementation: Option<Implementation>,
    dispatch_status: Option<i32>,
    combined: i32,
    published_enum: Option<EnumDecl>,
    revised_enum: Option<EnumDecl>,
    binaries: Vec<BinaryImage>,
    process: Option<ProcessImage>,
    baseline: Option<AbiManifest>,
    current: Option<AbiManifest>,
    report: Option<CompatReport>,
}

impl EvolutionWorld {
    fn new() -> Self {
        Self {
            caller: None,
            observations: Vec::new(),
            internal_value: 0,
            implementation: None,
            dispatch_status: None,
            combined: 0,
            published_enum: None,
            revised_enum: None,
            binaries: Vec::new(),
            process: None,
            baseline: None,
            current: None,
            report: None,
        }
    }

    fn last_init(&self) -> (&str, i32) {
        match self.observations.last() {
            Some(Observation::Init { name, age }) => (name.as_str(), *age),
            other => panic!("expected an init observation, got {:?}", other),
        }
    }
}

#[repr(C)]
struct ForeignVtable<const N: usize> {
    len: usize,
    slots: [unsafe extern "C" fn(*const c_void) -> i32; N],
}

unsafe extern "C" fn first_of(this: *const c_void) -> i32 {
    (*(this as *const (i32, i32))).0
}

unsafe extern "C" fn second_of(this: *const c_void) -> i32 {
    (*(this as *const (i32, i32))).1
}

fn dispatch_foreign(operations: usize, a: i32, b: i32, out: &mut i32) -> i32 {
    let receiver = (a, b);
    let this = &receiver as *const (i32, i32) as *const c_void;
    match operations {
        1 => {
            let vtable = ForeignVtable::<1> {
                len: 1,
                slots: [first_of],
            };
            let object = unsafe { ValuesObject::from_raw(&vtable as *const _ as *const ValuesVtable, this) };
            unsafe { api_v0_use_values(&object, out) }
        }
        2 => {
            let vtable = ForeignVtable::<2> {
                len: 2,
                slots: [first_of, second_of],
            };
            let object = unsafe { ValuesObject::from_raw(&vtable as *const _ as *const ValuesVtable, this) };
            unsafe { api_v0_use_values(&object, out) }
        }
        n => panic!("no foreign vtable with {} operations", n),
    }
}

// ==========================================================================
// Records
// ==========================================================================

#[given(expr = "a caller built against v0 passing the name {string}")]
async fn given_v0_caller(world: &mut EvolutionWorld, name: String) {
    world.caller = Some(Caller::V0 { name });
}

#[given(expr = "a caller built against v1 passing the name {string} and the age {int}")]
async fn given_v1_caller(world: &mut EvolutionWorld, name: String, age: i32) {
    world.caller = Some(Caller::V1 { name, age });
}

#[when("it calls init through its own scope")]
async fn when_calls_init(world: &mut EvolutionWorld) {
    let caller = world.caller.clone().expect("caller not set");
    observe::take();
    let status = match &caller {
        Caller::V0 { name } => {
            let bytes = encode(name);
            let params = old::Params {
                name: AbiStr::from(bytes.as_slice()),
            };
            unsafe { old::api_v0_init(&params) }
        }
        Caller::V1 { name, age } => {
            let bytes = encode(name);
            let params = Params::new(AbiStr::from(bytes.as_slice())).with_age(*age);
            unsafe { api_v1_init(&params) }
        }
    };
    assert_eq!(status, STATUS_OK);
    world.observations = observe::take();
}

#[then(expr = "the callee observes the name {string}")]
async fn then_observes_name(world: &mut EvolutionWorld, name: String) {
    assert_eq!(world.last_init().0, name);
}

#[then(expr = "the callee observes the age {int}")]
async fn then_observes_age(world: &mut EvolutionWorld, age: i32) {
    assert_eq!(world.last_init().1, age);
}

// ==========================================================================
// Functions
// ==========================================================================

#[when("an old binary calls the zero-argument foo symbol")]
async fn when_old_foo(world: &mut EvolutionWorld) {
    observe::take();
    api_v0_foo();
    world.observations.extend(observe::take());
}

#[when("a recompiled caller calls foo with no argument block")]
async fn when_foo_null_block(world: &mut EvolutionWorld) {
    observe::take();
    assert_eq!(unsafe { api_v1_foo(std::ptr::null()) }, STATUS_OK);
    world.observations.extend(observe::take());
}

#[when("a recompiled caller calls foo with a header-only argument block")]
async fn when_foo_header_only(world: &mut EvolutionWorld) {
    observe::take();
    assert_eq!(unsafe { api_v1_foo(&FooArgs::header_only()) }, STATUS_OK);
    world.observations.extend(observe::take());
}

#[when(expr = "a recompiled caller calls foo with the argument {int}")]
async fn when_foo_with_arg(world: &mut EvolutionWorld, arg: i32) {
    observe::take();
    assert_eq!(unsafe { api_v1_foo(&FooArgs::new(arg)) }, STATUS_OK);
    world.observations.extend(observe::take());
}

#[then(expr = "every call to foo observes the argument {int}")]
async fn then_foo_observes(world: &mut EvolutionWorld, arg: i32) {
    assert!(!world.observations.is_empty());
    for observation in &world.observations {
        assert_eq!(*observation, Observation::Foo { arg });
    }
}

// ==========================================================================
// Opaque handles
// ==========================================================================

#[given(expr = "an internal object created with the value {int}")]
async fn given_internal_object(world: &mut EvolutionWorld, value: i32) {
    world.internal_value = value;
}

#[then(expr = "the free accessor returns {int}")]
async fn then_free_accessor(world: &mut EvolutionWorld, expected: i32) {
    let handle = api_v0_internal_new(world.internal_value);
    let mut value = 0;
    let status = unsafe { api_v0_internal_get_value(handle, &mut value) };
    unsafe { api_v0_internal_release(handle) };
    assert_eq!(status, STATUS_OK);
    assert_eq!(value, expected);
}

#[then(expr = "the wrapper class returns {int}")]
async fn then_wrapper_class(world: &mut EvolutionWorld, expected: i32) {
    let wrapper = ExposedInternalClass::new(world.internal_value);
    assert_eq!(wrapper.get_value(), expected);
}

#[then("a clone of the wrapper outlives the original")]
async fn then_clone_outlives(world: &mut EvolutionWorld) {
    let clone = {
        let original = ExposedInternalClass::new(world.internal_value);
        let clone = original.clone();
        assert_eq!(clone.share_count(), 2);
        clone
    };
    assert_eq!(clone.share_count(), 1);
    assert_eq!(clone.get_value(), world.internal_value);
}

// ==========================================================================
// Interfaces
// ==========================================================================

#[given(expr = "an implementation built against {int} operations with values {int} and {int}")]
async fn given_foreign_implementation(world: &mut EvolutionWorld, operations: usize, a: i32, b: i32) {
    world.implementation = Some(Implementation::Foreign { operations, a, b });
}

#[given(expr = "a SomeClass with values {int} and {int}")]
async fn given_some_class(world: &mut EvolutionWorld, a: i32, b: i32) {
    world.implementation = Some(Implementation::Current(SomeClass::new(a, b)));
}

#[when("the library dispatches through it")]
async fn when_dispatch(world: &mut EvolutionWorld) {
    let implementation = world.implementation.clone().expect("implementation not set");
    let mut out = 0;
    observe::take();
    let status = match implementation {
        Implementation::Foreign { operations, a, b } => dispatch_foreign(operations, a, b, &mut out),
        Implementation::Current(object) => unsafe { api_v0_use_values(&object.as_object(), &mut out) },
    };
    world.observations = observe::take();
    world.dispatch_status = Some(status);
    world.combined = out;
}

#[then(expr = "the dispatched values are {int} and {int}")]
async fn then_dispatched_values(world: &mut EvolutionWorld, a: i32, b: i32) {
    assert_eq!(world.dispatch_status, Some(STATUS_OK));
    match world.observations.last() {
        Some(Observation::UseValues { a: seen_a, b: seen_b, .. }) => {
            assert_eq!((*seen_a, *seen_b), (a, b));
        }
        other => panic!("expected a dispatch observation, got {:?}", other),
    }
}

#[then(expr = "the combined value is {int}")]
async fn then_combined(world: &mut EvolutionWorld, combined: i32) {
    assert_eq!(world.combined, combined);
}

#[then(expr = "dispatch fails with status {int}")]
async fn then_dispatch_fails(world: &mut EvolutionWorld, status: i32) {
    assert_eq!(world.dispatch_status, Some(status));
    assert!(world.observations.is_empty());
}

// ==========================================================================
// Enumerations
// ==========================================================================

#[given("the published Mode enumeration")]
async fn given_published_mode(world: &mut EvolutionWorld) {
    let published = manifest::published_v0().expect("baseline parses");
    world.published_enum = published.enumeration("Mode").cloned();
    assert!(world.published_enum.is_some());
}

#[when(expr = "the variant {string} is appended with value {int}")]
async fn when_variant_appended(world: &mut EvolutionWorld, name: String, value: i64) {
    let published = world.published_enum.clone().expect("enumeration not set");
    world.revised_enum = Some(published.variant(name, value));
}

#[when(expr = "the variant {string} is inserted first with value {int}")]
async fn when_variant_inserted(world: &mut EvolutionWorld, name: String, value: i64) {
    let published = world.published_enum.clone().expect("enumeration not set");
    let mut revised = EnumDecl::new(published.name.clone(), published.scope.clone(), published.repr)
        .variant(name, value);
    revised.variants.extend(published.variants.iter().cloned());
    world.revised_enum = Some(revised);
}

#[then("the revision is accepted")]
async fn then_revision_accepted(world: &mut EvolutionWorld) {
    let (old, new) = (world.published_enum.as_ref().unwrap(), world.revised_enum.as_ref().unwrap());
    assert_eq!(check_enum(old, new), Ok(1));
}

#[then("the revision is rejected")]
async fn then_revision_rejected(world: &mut EvolutionWorld) {
    let (old, new) = (world.published_enum.as_ref().unwrap(), world.revised_enum.as_ref().unwrap());
    let violations = check_enum(old, new).unwrap_err();
    assert!(violations
        .iter()
        .any(|v| matches!(v, Violation::VariantInserted { .. })));
}

#[then("the storage size is unchanged")]
async fn then_storage_size_unchanged(world: &mut EvolutionWorld) {
    let (old, new) = (world.published_enum.as_ref().unwrap(), world.revised_enum.as_ref().unwrap());
    assert_eq!(old.storage_size(), new.storage_size());
    assert_eq!(new.storage_size(), Some(std::mem::size_of::<u32>()));
}

// ==========================================================================
// Inline code
// ==========================================================================

#[given(expr = "a binary {string} embedding {string} in {string} returning {int}")]
async fn given_binary(world: &mut EvolutionWorld, binary: String, name: String, scope: String, value: i32) {
    let scope: VersionScope = scope.parse().expect("valid scope");
    let body = format!("#[inline] pub fn {}() -> i32 {{ {} }}", name, value);
    world
        .binaries
        .push(BinaryImage::new(binary).with(InlineDefinition::new(scope, name, body)));
}

#[when("both binaries are loaded into one process")]
async fn when_binaries_loaded(world: &mut EvolutionWorld) {
    let mut process = ProcessImage::new();
    for binary in &world.binaries {
        process.load(binary);
    }
    world.process = Some(process);
}

#[then(expr = "an ODR collision is reported for {string}")]
async fn then_odr_collision(world: &mut EvolutionWorld, symbol: String) {
    let process = world.process.as_ref().expect("process not loaded");
    assert!(process.violations().iter().any(|v| matches!(
        v,
        Violation::OdrCollision { symbol: s, .. } if *s == symbol
    )));
}

#[then(expr = "{string} resolves to {string}")]
async fn then_resolves_to(world: &mut EvolutionWorld, symbol: String, binary: String) {
    let process = world.process.as_ref().expect("process not loaded");
    assert_eq!(process.resolve(&symbol), Some(binary.as_str()));
}

#[then("no ODR collision is reported")]
async fn then_no_odr_collision(world: &mut EvolutionWorld) {
    let process = world.process.as_ref().expect("process not loaded");
    assert!(process.violations().is_empty());
    assert_eq!(process.loaded().len(), world.binaries.len());
}

// ==========================================================================
// Whole surface
// ==========================================================================

#[given("the published v0 manifest")]
async fn given_published_manifest(world: &mut EvolutionWorld) {
    world.baseline = Some(manifest::published_v0().expect("baseline parses"));
}

#[given("the current surface published as the baseline")]
async fn given_current_as_baseline(world: &mut EvolutionWorld) {
    world.baseline = Some(manifest::current().expect("current manifest"));
}

#[when(expr = "the default of {string} parameter {string} becomes {string}")]
async fn when_param_default_changed(
    world: &mut EvolutionWorld,
    function: String,
    param: String,
    default: String,
) {
    let mut current = manifest::current().expect("current manifest");
    let decl = current
        .functions
        .iter_mut()
        .find(|f| f.qualified_name() == function)
        .expect("function declared");
    let param = decl
        .params
        .iter_mut()
        .find(|p| p.name == param)
        .expect("parameter declared");
    param.default = Some(default);
    world.current = Some(current);
}

#[when(expr = "{string} is edited in place to return {int}")]
async fn when_inline_edited(world: &mut EvolutionWorld, symbol: String, value: i32) {
    let mut current = manifest::current().expect("current manifest");
    let definition = current
        .inline
        .iter_mut()
        .find(|d| d.symbol() == symbol)
        .expect("inline definition registered");
    definition.body = format!("#[inline] pub fn {}() -> i32 {{ {} }}", definition.name, value);
    world.current = Some(current);
}

#[when("the current surface is compared with it")]
async fn when_compared(world: &mut EvolutionWorld) {
    let baseline = world.baseline.as_ref().expect("baseline not loaded");
    let current = match world.current.take() {
        Some(current) => current,
        None => manifest::current().expect("current manifest"),
    };
    world.report = Some(compare(baseline, &current, &Policy::strict()));
}

#[then("the surface is compatible")]
async fn then_compatible(world: &mut EvolutionWorld) {
    let report = world.report.as_ref().expect("no report");
    assert!(report.is_compatible(), "{}", report.summary());
}

#[then(expr = "the report contains an inline change for {string}")]
async fn then_inline_change(world: &mut EvolutionWorld, symbol: String) {
    let report = world.report.as_ref().expect("no report");
    assert!(report.violations.iter().any(|v| matches!(
        v,
        Violation::InlineChangedInPlace { symbol: s } if *s == symbol
    )));
}

#[then(expr = "the report contains a default change for {string}")]
async fn then_default_change(world: &mut EvolutionWorld, param: String) {
    let report = world.report.as_ref().expect("no report");
    assert!(!report.is_compatible());
    assert!(report.violations.iter().any(|v| matches!(
        v,
        Violation::ParamDefaultChanged { param: p, .. } if *p == param
    )));
}
