//! Kernel Object Registry - handle-addressed storage for HLE kernel primitives
//!
//! # Purpose
//! Gives every emulated kernel primitive (threads, semaphores, mutexes, event
//! flags, message pipes, memory pools, timers, callbacks, modules, files) a
//! stable 32-bit handle, and freezes or rebuilds the whole heterogeneous
//! object set for save-states.
//!
//! # Architecture
//! - [`KernelObjectPool`]: fixed-capacity slot table, sole owner of every object
//! - [`KernelObject`]: what the pool needs to know about an object
//! - [`Object<P>`]: the concrete object type, one [`Payload`] per [`ObjectKind`]
//! - [`ObjectFactory`]: rebuilds blank objects from a stored kind tag
//!
//! # Example
//! ```
//! use hle_kobj::{KernelObject, KernelObjectPool, Semaphore, SemaphoreState};
//!
//! let mut pool = KernelObjectPool::new();
//! let handle = pool.insert(Semaphore::boxed("vblank", SemaphoreState::default()));
//! assert!(!handle.is_none());
//! assert_eq!(pool.get_as::<Semaphore>(handle).unwrap().name(), "vblank");
//! ```
//!
//! # Testing Strategy
//! - Unit tests: allocation cursor, typed lookups, per-kind state
//! - Integration tests: registry properties and snapshot round-trips

pub mod error_codes;

mod error;
mod factory;
mod kind;
mod kinds;
mod object;
mod pool;

pub use error::{PoolError, Result};
pub use factory::{blank_object, BuiltinFactory, ObjectFactory};
pub use kind::{ObjectKind, LEGACY_TLSPL_KIND};
pub use kinds::*;
pub use object::{Handle, KernelObject, Object, Payload, TypedObject, MAX_NAME_LEN};
pub use pool::{
    KernelObjectPool, ObjectListing, CAPACITY, DEFAULT_RANGE_BOTTOM, HANDLE_BASE,
    INITIAL_NEXT_SLOT, SECTION_TITLE,
};
