//! Compiled auxiliary script bundles.
//!
//! A bundle is an immutable set of modules compiled against one VM instance
//! from a fixed embedded table. Compilation and disposal both require the
//! VM's execution lock, passed as a [`VmScope`].

use crate::error::EngineError;
use crate::vm::{VmId, VmScope};

/// One named source module belonging to a bundle table.
pub struct BundleModule {
    /// Module name, unique across all bundles loaded into one VM
    pub name: &'static str,
    /// Module source text
    pub source: &'static str,
}

#[derive(Debug)]
struct CompiledModule {
    name: &'static str,
    checksum: u32,
}

/// An immutable compiled module set tied to one VM instance.
#[derive(Debug)]
pub struct Bundle {
    vm: VmId,
    modules: Vec<CompiledModule>,
}

impl Bundle {
    /// Compile `modules` inside `scope`, registering each with the VM.
    ///
    /// Fails if any module has empty source, a name already registered with
    /// the VM, or the VM has been disposed.
    pub fn compile(scope: &VmScope<'_>, modules: &[BundleModule]) -> Result<Bundle, EngineError> {
        let mut compiled = Vec::with_capacity(modules.len());

        for module in modules {
            if module.source.trim().is_empty() {
                return Err(EngineError::Compile {
                    module: module.name.to_string(),
                    reason: "empty source".to_string(),
                });
            }

            let checksum = crc32fast::hash(module.source.as_bytes());
            scope.register_module(module.name, checksum)?;
            compiled.push(CompiledModule {
                name: module.name,
                checksum,
            });
        }

        Ok(Bundle {
            vm: scope.vm().id(),
            modules: compiled,
        })
    }

    /// The VM this bundle was compiled against.
    pub fn vm_id(&self) -> VmId {
        self.vm
    }

    /// Number of modules in this bundle.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Checksum of the named module's source, if it belongs to this bundle.
    pub fn module_checksum(&self, name: &str) -> Option<u32> {
        self.modules
            .iter()
            .find(|module| module.name == name)
            .map(|module| module.checksum)
    }

    /// Unregister this bundle's modules from the VM.
    ///
    /// `scope` must lock the same VM the bundle was compiled against.
    pub fn dispose(&self, scope: &VmScope<'_>) {
        debug_assert_eq!(self.vm, scope.vm().id());
        for module in &self.modules {
            scope.unregister_module(module.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{VmInstance, VmParams};
    use std::sync::Arc;

    struct NoopAllocator;

    impl crate::alloc::BufferAllocator for NoopAllocator {
        fn allocate(&self, _len: usize) -> *mut u8 {
            std::ptr::NonNull::dangling().as_ptr()
        }

        fn allocate_uninitialized(&self, _len: usize) -> *mut u8 {
            std::ptr::NonNull::dangling().as_ptr()
        }

        unsafe fn free(&self, _ptr: *mut u8, _len: usize) {}
    }

    static TEST_MODULES: &[BundleModule] = &[
        BundleModule {
            name: "alpha",
            source: "export const value = 1;",
        },
        BundleModule {
            name: "beta",
            source: "export const value = 2;",
        },
    ];

    fn create_test_vm() -> Arc<VmInstance> {
        crate::engine::initialize();
        VmInstance::new(VmParams {
            buffer_allocator: Arc::new(NoopAllocator),
        })
        .unwrap()
    }

    #[test]
    fn test_compile_registers_modules() {
        let vm = create_test_vm();
        let scope = vm.lock();

        let bundle = Bundle::compile(&scope, TEST_MODULES).unwrap();
        assert_eq!(bundle.module_count(), 2);
        assert_eq!(bundle.vm_id(), vm.id());
        assert!(scope.has_module("alpha"));
        assert!(scope.has_module("beta"));
        assert!(bundle.module_checksum("alpha").is_some());
        assert!(bundle.module_checksum("missing").is_none());

        drop(scope);
        crate::engine::shutdown();
    }

    #[test]
    fn test_compile_rejects_empty_source() {
        let vm = create_test_vm();
        let scope = vm.lock();

        static BAD: &[BundleModule] = &[BundleModule {
            name: "empty",
            source: "   ",
        }];

        let err = Bundle::compile(&scope, BAD).unwrap_err();
        assert!(matches!(err, EngineError::Compile { .. }));

        drop(scope);
        crate::engine::shutdown();
    }

    #[test]
    fn test_compile_rejects_duplicate_names() {
        let vm = create_test_vm();
        let scope = vm.lock();

        let _first = Bundle::compile(&scope, TEST_MODULES).unwrap();
        let err = Bundle::compile(&scope, TEST_MODULES).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateModule(_)));

        drop(scope);
        crate::engine::shutdown();
    }

    #[test]
    fn test_dispose_unregisters_modules() {
        let vm = create_test_vm();
        let scope = vm.lock();

        let bundle = Bundle::compile(&scope, TEST_MODULES).unwrap();
        assert_eq!(scope.module_count(), 2);

        bundle.dispose(&scope);
        assert_eq!(scope.module_count(), 0);

        drop(scope);
        crate::engine::shutdown();
    }
}
