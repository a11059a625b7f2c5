//! HLE Kernel - lifecycle and save-state sequencing for the emulated kernel
//!
//! # Purpose
//! Brings the kernel object pool and every dependent HLE subsystem up and
//! down in a fixed dependency order, and sequences the full multi-section
//! snapshot that covers them all.
//!
//! # Architecture
//! ```text
//!   Kernel ──owns──► KernelObjectPool   (handle table, hle-kobj)
//!     │    ──owns──► EventScheduler     (timed events)
//!     │    ──owns──► KernelState        (running flag, GPO/GPI, exit callback)
//!     └──drives───► dyn Subsystem       (init / shutdown / do_state)
//! ```
//!
//! State machine: `Stopped --init--> Running --shutdown--> Stopped`. Redundant
//! transitions are logged and ignored.
//!
//! # Testing Strategy
//! - Unit tests: ordering tables, config, event queue, state registers
//! - Integration tests: lifecycle scenarios and full snapshot round-trips

mod config;
mod kernel;
mod state;
mod subsystem;
mod timing;

pub use config::KernelConfig;
pub use kernel::{Kernel, KERNEL_SECTION_VERSION, STATE_SECTIONS};
pub use state::KernelState;
pub use subsystem::{
    KernelContext, Subsystem, SubsystemError, SubsystemId, HLE_MODULE_STATE_ORDER, INIT_ORDER,
    KERNEL_MODULE_STATE_ORDER, LATE_SHUTDOWN_ORDER, LATE_STATE_ORDER, SHUTDOWN_ORDER,
};
pub use timing::{EventScheduler, EventTypeId, FiredEvent, TimingError};
