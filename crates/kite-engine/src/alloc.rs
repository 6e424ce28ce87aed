//! Raw buffer allocation contract for engine-managed binary data.

/// Allocator backing the engine's binary buffer payloads.
///
/// The engine allocates and frees buffers through this trait so an embedder
/// can route them to its own allocator. Implementations must be callable from
/// any thread.
pub trait BufferAllocator: Send + Sync {
    /// Allocate `len` zero-initialized bytes.
    ///
    /// A zero `len` must still yield a non-null (possibly dangling) pointer.
    fn allocate(&self, len: usize) -> *mut u8;

    /// Allocate `len` uninitialized bytes.
    fn allocate_uninitialized(&self, len: usize) -> *mut u8;

    /// Release a buffer of `len` bytes.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by one of this allocator's allocate
    /// methods with the same `len`, and must not be used afterwards.
    unsafe fn free(&self, ptr: *mut u8, len: usize);
}
