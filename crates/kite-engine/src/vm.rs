//! VM instances and their execution lock.

use crate::alloc::BufferAllocator;
use crate::error::EngineError;
use once_cell::sync::OnceCell;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handler invoked when the engine hits an unrecoverable internal error.
///
/// By engine convention the process does not survive a fatal error; after the
/// handler returns, the engine aborts.
pub type FatalErrorHandler = fn(location: &str, message: &str);

static NEXT_VM_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a VM instance
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VmId(u64);

impl VmId {
    fn next() -> Self {
        VmId(NEXT_VM_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Parameters for creating a VM instance
pub struct VmParams {
    /// Allocator backing engine buffer payloads
    pub buffer_allocator: Arc<dyn BufferAllocator>,
}

struct VmState {
    /// Modules registered by compiled bundles, keyed by name
    modules: FxHashMap<String, u32>,
    disposed: bool,
}

/// One isolated execution context of the engine.
///
/// All VM-visible state must be touched while holding the execution lock,
/// acquired via [`VmInstance::lock`]. The lock is reentrant: code already
/// inside a scope may lock again, which happens when a task running on the
/// script thread triggers lazy bundle compilation.
pub struct VmInstance {
    id: VmId,
    state: ReentrantMutex<RefCell<VmState>>,
    buffer_allocator: Arc<dyn BufferAllocator>,
    fatal_handler: OnceCell<FatalErrorHandler>,
}

impl VmInstance {
    /// Create a VM instance. The engine globals must be live.
    pub fn new(params: VmParams) -> Result<Arc<Self>, EngineError> {
        if !crate::engine::is_initialized() {
            return Err(EngineError::NotInitialized);
        }

        Ok(Arc::new(Self {
            id: VmId::next(),
            state: ReentrantMutex::new(RefCell::new(VmState {
                modules: FxHashMap::default(),
                disposed: false,
            })),
            buffer_allocator: params.buffer_allocator,
            fatal_handler: OnceCell::new(),
        }))
    }

    /// This instance's unique ID.
    pub fn id(&self) -> VmId {
        self.id
    }

    /// The allocator backing this instance's buffer payloads.
    pub fn buffer_allocator(&self) -> &Arc<dyn BufferAllocator> {
        &self.buffer_allocator
    }

    /// Install the fatal-error handler. The first installation wins.
    pub fn set_fatal_error_handler(&self, handler: FatalErrorHandler) {
        let _ = self.fatal_handler.set(handler);
    }

    /// Report an engine-internal fatal error and abort the process.
    pub fn report_fatal_error(&self, location: &str, message: &str) -> ! {
        if let Some(handler) = self.fatal_handler.get() {
            handler(location, message);
        }
        std::process::abort();
    }

    /// Acquire the execution lock, entering a scope in which this VM's state
    /// may be used on the current thread.
    pub fn lock(&self) -> VmScope<'_> {
        VmScope {
            guard: self.state.lock(),
            vm: self,
        }
    }

    /// Tear down this instance. Further module registration fails with
    /// [`EngineError::VmDisposed`].
    pub fn dispose(&self) {
        let guard = self.state.lock();
        guard.borrow_mut().disposed = true;
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        let guard = self.state.lock();
        let disposed = guard.borrow().disposed;
        disposed
    }
}

/// Proof of holding a VM's execution lock on the current thread.
///
/// Not `Send`: a scope cannot migrate off the thread that acquired it.
pub struct VmScope<'vm> {
    guard: ReentrantMutexGuard<'vm, RefCell<VmState>>,
    vm: &'vm VmInstance,
}

impl VmScope<'_> {
    /// The VM this scope locks.
    pub fn vm(&self) -> &VmInstance {
        self.vm
    }

    /// Number of modules currently registered with the VM.
    pub fn module_count(&self) -> usize {
        self.guard.borrow().modules.len()
    }

    /// Whether a module with `name` is registered.
    pub fn has_module(&self, name: &str) -> bool {
        self.guard.borrow().modules.contains_key(name)
    }

    pub(crate) fn register_module(&self, name: &str, checksum: u32) -> Result<(), EngineError> {
        let mut state = self.guard.borrow_mut();
        if state.disposed {
            return Err(EngineError::VmDisposed);
        }
        if state.modules.contains_key(name) {
            return Err(EngineError::DuplicateModule(name.to_string()));
        }
        state.modules.insert(name.to_string(), checksum);
        Ok(())
    }

    pub(crate) fn unregister_module(&self, name: &str) {
        self.guard.borrow_mut().modules.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopAllocator;

    impl BufferAllocator for NoopAllocator {
        fn allocate(&self, _len: usize) -> *mut u8 {
            std::ptr::NonNull::dangling().as_ptr()
        }

        fn allocate_uninitialized(&self, _len: usize) -> *mut u8 {
            std::ptr::NonNull::dangling().as_ptr()
        }

        unsafe fn free(&self, _ptr: *mut u8, _len: usize) {}
    }

    fn create_test_vm() -> Arc<VmInstance> {
        crate::engine::initialize();
        VmInstance::new(VmParams {
            buffer_allocator: Arc::new(NoopAllocator),
        })
        .unwrap()
    }

    #[test]
    fn test_vm_creation() {
        let vm = create_test_vm();
        assert!(vm.id().as_u64() > 0);
        assert!(!vm.is_disposed());
        crate::engine::shutdown();
    }

    #[test]
    fn test_vm_ids_unique() {
        let vm1 = create_test_vm();
        let vm2 = create_test_vm();
        assert_ne!(vm1.id(), vm2.id());
        crate::engine::shutdown();
        crate::engine::shutdown();
    }

    #[test]
    fn test_lock_is_reentrant() {
        let vm = create_test_vm();
        let outer = vm.lock();
        let inner = vm.lock();
        assert_eq!(outer.module_count(), inner.module_count());
        drop(inner);
        drop(outer);
        crate::engine::shutdown();
    }

    #[test]
    fn test_module_registration() {
        let vm = create_test_vm();
        let scope = vm.lock();

        scope.register_module("core", 0xdead_beef).unwrap();
        assert!(scope.has_module("core"));
        assert_eq!(scope.module_count(), 1);

        let err = scope.register_module("core", 0).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateModule(_)));

        scope.unregister_module("core");
        assert!(!scope.has_module("core"));
        drop(scope);
        crate::engine::shutdown();
    }

    #[test]
    fn test_disposed_vm_rejects_registration() {
        let vm = create_test_vm();
        vm.dispose();
        assert!(vm.is_disposed());

        let scope = vm.lock();
        let err = scope.register_module("late", 1).unwrap_err();
        assert!(matches!(err, EngineError::VmDisposed));
        drop(scope);
        crate::engine::shutdown();
    }
}
