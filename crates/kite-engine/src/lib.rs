//! Kite Script Engine — embedding surface
//!
//! This crate provides the contract between the Kite script engine and a
//! host application that embeds it:
//! - **Tasks**: opaque work units the engine hands to the embedder (`task`)
//! - **Platform**: the callback contract an embedder must satisfy (`platform`)
//! - **VM instances**: isolated execution contexts with an acquirable
//!   execution lock (`vm`)
//! - **Bundles**: precompiled auxiliary script module sets (`bundle`)
//! - **Buffers**: the raw-buffer allocation contract (`alloc`)
//!
//! The engine internals (parser, interpreter, GC) live elsewhere; this crate
//! is the surface an embedding layer programs against.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod alloc;
pub mod bundle;
pub mod engine;
pub mod error;
pub mod platform;
pub mod task;
pub mod vm;

pub use alloc::BufferAllocator;
pub use bundle::{Bundle, BundleModule};
pub use error::EngineError;
pub use platform::Platform;
pub use task::{IdleTask, Task};
pub use vm::{FatalErrorHandler, VmId, VmInstance, VmParams, VmScope};
