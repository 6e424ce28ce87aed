//! Buffer allocator shim backed by the host's global allocator.

use kite_engine::BufferAllocator;
use std::alloc::{alloc, alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

/// Pass-through allocator satisfying the engine buffer contract.
///
/// No pooling and no alignment guarantees beyond the global allocator's.
/// Zero-length requests yield a dangling non-null pointer that must not be
/// dereferenced; freeing such a pointer is a no-op.
#[derive(Debug, Default)]
pub struct SystemBufferAllocator;

impl SystemBufferAllocator {
    /// Create the shim.
    pub fn new() -> Self {
        Self
    }

    fn layout(len: usize) -> Layout {
        // Byte buffers only; a length over isize::MAX is a caller bug and
        // aborts per the engine's platform-callback convention.
        Layout::from_size_align(len, 1).expect("buffer length overflows the address space")
    }
}

impl BufferAllocator for SystemBufferAllocator {
    fn allocate(&self, len: usize) -> *mut u8 {
        if len == 0 {
            return NonNull::<u8>::dangling().as_ptr();
        }
        unsafe { alloc_zeroed(Self::layout(len)) }
    }

    fn allocate_uninitialized(&self, len: usize) -> *mut u8 {
        if len == 0 {
            return NonNull::<u8>::dangling().as_ptr();
        }
        unsafe { alloc(Self::layout(len)) }
    }

    unsafe fn free(&self, ptr: *mut u8, len: usize) {
        if len == 0 {
            return;
        }
        dealloc(ptr, Self::layout(len));
    }
}
