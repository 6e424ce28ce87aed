//! Kite Host Platform
//!
//! Bridges the Kite engine's platform contract onto the host's concurrency
//! substrate: a script-dedicated cooperative thread plus a shared background
//! worker pool. All VM-visible state is touched only from the script thread,
//! serialized by the VM's execution lock.
//!
//! - **scheduler**: the two executors — background [`ThreadPool`] and the
//!   script thread's [`EventLoop`] with its timer heap
//! - **platform**: [`ScriptPlatform`], the engine-facing façade
//! - **bundles**: the capability bundle cache (`runtime`/`debug` eager,
//!   `objc`/`java` lazy and memoized)
//! - **alloc**: the pass-through buffer allocator shim
//!
//! # Example
//!
//! ```rust,ignore
//! use kite_engine::Platform;
//! use kite_platform::ScriptPlatform;
//!
//! let platform = ScriptPlatform::new()?;
//! let vm = platform.vm().clone();
//! platform.call_on_foreground_thread(&vm, Box::new(|| {
//!     // runs on the script thread with the VM lock held
//! }));
//! platform.dispose();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod alloc;
pub mod bundles;
mod clock;
mod dispatch;
pub mod platform;
mod request;
pub mod scheduler;

pub use alloc::SystemBufferAllocator;
pub use bundles::BundleCache;
pub use clock::MonotonicClock;
pub use platform::{PlatformError, ScriptPlatform};
pub use scheduler::{EventLoop, Job, Priority, ScriptScheduler, ThreadPool, TimerFire};
