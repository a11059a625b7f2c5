//! Save-State Framing - sectioned binary snapshots of emulator state
//!
//! # Purpose
//! Every subsystem that participates in a save-state walks its own state
//! through a [`StateWrap`]. The same `do_state` routine is used for saving,
//! restoring and measuring, so the write and read paths cannot drift apart.
//!
//! # Framing
//! A snapshot is an ordered stream of named, versioned sections:
//!
//! ```text
//! ┌──────────────┬──────────────┬──────────────┬──────────────────┐
//! │ title (str)  │ version (u32)│ length (u32) │ body (length B)  │
//! └──────────────┴──────────────┴──────────────┴──────────────────┘
//! ```
//!
//! Sections nest. A section read fails the whole restore when the title does
//! not match, when the stored version is outside the reader's supported
//! range, or when the body does not consume exactly `length` bytes.
//!
//! # Encoding
//! Values inside a section are encoded with bincode using fixed-width
//! little-endian integers, so a `u32` is always four bytes on the wire.
//!
//! # Testing Strategy
//! - Unit tests: section framing, version gating, truncation
//! - Integration tests: `tests/framing_test.rs`, plus the registry and kernel
//!   snapshot tests in the crates built on top

mod error;
mod wrap;

pub use error::{Result, StateError};
pub use wrap::{scan_sections, Mode, SectionHeader, StateWrap};

/// State that can be walked through a [`StateWrap`]
///
/// Implementations must read and write the exact same sequence of values
/// regardless of the wrap's mode.
pub trait Stateful {
    /// Save, restore or measure this value depending on `p.mode()`
    fn do_state(&mut self, p: &mut StateWrap<'_>) -> Result<()>;
}
