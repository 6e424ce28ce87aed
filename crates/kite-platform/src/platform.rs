//! Platform façade implementing the engine's callback contract.

use crate::alloc::SystemBufferAllocator;
use crate::bundles::BundleCache;
use crate::clock::MonotonicClock;
use crate::dispatch;
use crate::request::{IdleTaskRequest, TaskRequest};
use crate::scheduler::{Priority, ScriptScheduler};
use kite_engine::{engine, Bundle, EngineError, IdleTask, Platform, Task, VmInstance, VmParams};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Errors that can occur while bringing the platform up.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Engine-side failure (VM construction, bundle compilation)
    #[error(transparent)]
    Engine(#[from] EngineError),
}

fn report_fatal_error(location: &str, message: &str) {
    tracing::error!(location, message, "engine fatal error");
}

/// The bridge between the engine's platform contract and the host scheduler.
///
/// Exactly one script thread serves all VM-affine work, serialized by the
/// VM's execution lock; a shared pool sized to the processor count serves the
/// rest. Teardown is race-safe against in-flight background submissions:
/// `disposing` is checked at dispatch time, and a background dispatch that
/// loses the race runs synchronously on the calling thread instead of being
/// queued into a pool that may already be shutting down.
pub struct ScriptPlatform {
    disposing: AtomicBool,
    clock: MonotonicClock,
    scheduler: ScriptScheduler,
    vm: Arc<VmInstance>,
    bundles: BundleCache,
}

impl ScriptPlatform {
    /// Bring up the scheduler, the engine globals, one VM instance with the
    /// buffer allocator and fatal-error handler installed, and the
    /// always-present `runtime` and `debug` bundles.
    pub fn new() -> Result<Self, PlatformError> {
        let scheduler = ScriptScheduler::new();
        engine::initialize();

        let vm = match VmInstance::new(VmParams {
            buffer_allocator: Arc::new(SystemBufferAllocator::new()),
        }) {
            Ok(vm) => vm,
            Err(err) => {
                engine::shutdown();
                scheduler.stop();
                return Err(err.into());
            }
        };
        vm.set_fatal_error_handler(report_fatal_error);

        // Transient lock scope: nothing else can be running script work yet,
        // but bundle compilation still requires a VmScope.
        let bundles = {
            let scope = vm.lock();
            match BundleCache::compile(&scope) {
                Ok(bundles) => bundles,
                Err(err) => {
                    drop(scope);
                    vm.dispose();
                    engine::shutdown();
                    scheduler.stop();
                    return Err(err.into());
                }
            }
        };

        Ok(Self {
            disposing: AtomicBool::new(false),
            clock: MonotonicClock::start(),
            scheduler,
            vm,
            bundles,
        })
    }

    /// The VM instance owned by this platform.
    pub fn vm(&self) -> &Arc<VmInstance> {
        &self.vm
    }

    /// Whether teardown has begun. Monotonic: once true, never reset.
    pub fn is_disposing(&self) -> bool {
        self.disposing.load(Ordering::Acquire)
    }

    /// The `runtime` bundle, compiled at init.
    pub fn runtime_bundle(&self) -> &Arc<Bundle> {
        self.bundles.runtime_bundle()
    }

    /// The `debug` bundle, compiled at init.
    pub fn debug_bundle(&self) -> &Arc<Bundle> {
        self.bundles.debug_bundle()
    }

    /// The `objc` capability bundle, compiled on first request and cached.
    pub fn objc_bundle(&self) -> Result<&Arc<Bundle>, EngineError> {
        self.bundles.objc_bundle(&self.vm)
    }

    /// The `java` capability bundle, compiled on first request and cached.
    pub fn java_bundle(&self) -> Result<&Arc<Bundle>, EngineError> {
        self.bundles.java_bundle(&self.vm)
    }

    /// Source map for the `runtime` bundle.
    pub fn runtime_source_map(&self) -> &'static str {
        self.bundles.runtime_source_map()
    }

    /// Source map for the `objc` bundle.
    pub fn objc_source_map(&self) -> &'static str {
        self.bundles.objc_source_map()
    }

    /// Source map for the `java` bundle.
    pub fn java_source_map(&self) -> &'static str {
        self.bundles.java_source_map()
    }

    /// Tear the platform down. Subsequent calls (including the one from
    /// `Drop`) are no-ops.
    ///
    /// Order matters: `disposing` flips first so a background completion
    /// racing with teardown falls back to the synchronous dispatch path;
    /// bundles are disposed inside a single VM-lock scope; the VM and engine
    /// globals go next; the scheduler is stopped and released last.
    pub fn dispose(&self) {
        if self.disposing.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!("platform teardown started");

        {
            let scope = self.vm.lock();
            self.bundles.teardown(&scope);
        }

        self.vm.dispose();
        engine::shutdown();
        self.scheduler.stop();
    }

    fn assert_accepting_vm_work(&self) {
        assert!(
            !self.is_disposing(),
            "VM-affine dispatch after teardown has begun"
        );
    }
}

impl Platform for ScriptPlatform {
    fn call_on_background_thread(&self, task: Box<dyn Task>) {
        if self.is_disposing() {
            // The pool may be partially torn down; run in place.
            task.run();
            return;
        }

        let request = TaskRequest::background(task);
        self.scheduler
            .push_job_on_thread_pool(Box::new(move || dispatch::handle_task_request(request)));
    }

    fn call_on_foreground_thread(&self, vm: &Arc<VmInstance>, task: Box<dyn Task>) {
        self.assert_accepting_vm_work();

        let request = TaskRequest::foreground(Arc::clone(vm), task);
        self.scheduler.push_job_on_script_thread(
            Priority::Default,
            Box::new(move || dispatch::handle_task_request(request)),
        );
    }

    fn call_delayed_on_foreground_thread(
        &self,
        vm: &Arc<VmInstance>,
        task: Box<dyn Task>,
        delay_seconds: f64,
    ) {
        self.assert_accepting_vm_work();

        let mut slot = Some(TaskRequest::foreground(Arc::clone(vm), task));
        let delay = Duration::from_millis((delay_seconds * 1000.0) as u64);
        self.scheduler.event_loop().add_timeout(
            delay,
            Box::new(move || dispatch::handle_delayed_task_request(&mut slot)),
        );
    }

    fn call_idle_on_foreground_thread(&self, vm: &Arc<VmInstance>, task: Box<dyn IdleTask>) {
        self.assert_accepting_vm_work();

        let request = IdleTaskRequest::new(Arc::clone(vm), task, self.clock);
        self.scheduler.push_job_on_script_thread(
            Priority::Default,
            Box::new(move || dispatch::handle_idle_task_request(request)),
        );
    }

    fn idle_tasks_enabled(&self, _vm: &Arc<VmInstance>) -> bool {
        true
    }

    fn available_background_threads(&self) -> usize {
        self.scheduler.pool_thread_count()
    }

    fn monotonically_increasing_time(&self) -> f64 {
        self.clock.now_seconds()
    }
}

impl Drop for ScriptPlatform {
    fn drop(&mut self) {
        self.dispose();
    }
}
