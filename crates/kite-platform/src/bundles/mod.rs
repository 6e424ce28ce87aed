//! Capability bundle cache.
//!
//! Four named slots, each a compiled module set plus a source-map string.
//! `runtime` and `debug` compile eagerly at platform init inside one VM-lock
//! scope; `objc` and `java` compile lazily on first request and are memoized
//! for the platform's lifetime. Lazy creation only ever happens on a thread
//! already holding the VM lock (single-writer confinement); the `OnceCell`
//! additionally keeps it sound if that discipline is ever broken.

pub mod modules;

use kite_engine::{Bundle, EngineError, VmInstance, VmScope};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Cache of the platform's capability bundles.
pub struct BundleCache {
    runtime: Arc<Bundle>,
    debug: Arc<Bundle>,
    objc: OnceCell<Arc<Bundle>>,
    java: OnceCell<Arc<Bundle>>,
}

impl BundleCache {
    /// Eagerly compile the `runtime` and `debug` bundles inside `scope`.
    pub(crate) fn compile(scope: &VmScope<'_>) -> Result<Self, EngineError> {
        Ok(Self {
            runtime: Arc::new(Bundle::compile(scope, modules::RUNTIME_MODULES)?),
            debug: Arc::new(Bundle::compile(scope, modules::DEBUG_MODULES)?),
            objc: OnceCell::new(),
            java: OnceCell::new(),
        })
    }

    /// The `runtime` bundle. Present from init onwards.
    pub fn runtime_bundle(&self) -> &Arc<Bundle> {
        &self.runtime
    }

    /// The `debug` bundle. Present from init onwards.
    pub fn debug_bundle(&self) -> &Arc<Bundle> {
        &self.debug
    }

    /// The `objc` bundle, compiled on first request and memoized: a second
    /// request returns the identical cached instance.
    pub fn objc_bundle(&self, vm: &VmInstance) -> Result<&Arc<Bundle>, EngineError> {
        self.objc.get_or_try_init(|| {
            let scope = vm.lock();
            Bundle::compile(&scope, modules::OBJC_MODULES).map(Arc::new)
        })
    }

    /// The `java` bundle, compiled on first request and memoized.
    pub fn java_bundle(&self, vm: &VmInstance) -> Result<&Arc<Bundle>, EngineError> {
        self.java.get_or_try_init(|| {
            let scope = vm.lock();
            Bundle::compile(&scope, modules::JAVA_MODULES).map(Arc::new)
        })
    }

    /// Source map for the `runtime` bundle.
    pub fn runtime_source_map(&self) -> &'static str {
        modules::RUNTIME_SOURCE_MAP
    }

    /// Source map for the `objc` bundle.
    pub fn objc_source_map(&self) -> &'static str {
        modules::OBJC_SOURCE_MAP
    }

    /// Source map for the `java` bundle.
    pub fn java_source_map(&self) -> &'static str {
        modules::JAVA_SOURCE_MAP
    }

    /// Dispose every created bundle inside `scope`. Lazy slots are skipped
    /// when they were never requested; `debug` and `runtime` always go.
    /// Called exactly once, from platform teardown.
    pub(crate) fn teardown(&self, scope: &VmScope<'_>) {
        if let Some(bundle) = self.objc.get() {
            bundle.dispose(scope);
        }
        if let Some(bundle) = self.java.get() {
            bundle.dispose(scope);
        }
        self.debug.dispose(scope);
        self.runtime.dispose(scope);
    }
}
