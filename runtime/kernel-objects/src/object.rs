//! Kernel object abstraction
//!
//! Every live kernel primitive is a `Box<dyn KernelObject>` owned by the
//! registry. Concrete kinds are [`Object<P>`] instances whose payload type
//! fixes the kind at compile time.

use core::any::Any;
use core::fmt;

use hle_savestate::StateWrap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::kind::ObjectKind;

/// Longest display name the guest kernel keeps, in characters
pub const MAX_NAME_LEN: usize = 31;

/// Guest-visible identity of a kernel object
///
/// `Handle::NONE` (0) is never the identity of a live object; `create`
/// returns it to signal allocation failure.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Handle(u32);

impl Handle {
    /// Allocation failure sentinel
    pub const NONE: Handle = Handle(0);

    /// Wrap a raw guest value
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Handle(raw)
    }

    /// Raw guest value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is the failure sentinel
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Handle> for u32 {
    fn from(handle: Handle) -> u32 {
        handle.0
    }
}

/// A kernel object as seen by the registry
///
/// The registry never looks inside the payload. It needs the identity
/// accessors for bookkeeping, the descriptive ones for `list`, and
/// `do_state` for snapshots.
pub trait KernelObject: Any + fmt::Debug {
    /// Handle assigned by the registry, `Handle::NONE` before registration
    fn handle(&self) -> Handle;

    /// Called by the registry when the object is placed in a slot
    fn set_handle(&mut self, handle: Handle);

    /// Kind discriminant, fixed for the object's lifetime
    fn kind(&self) -> ObjectKind;

    /// Display name given by the guest
    fn name(&self) -> &str;

    /// Type name used in listings
    fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// One-line status for diagnostics
    fn quick_info(&self) -> String {
        String::from("-")
    }

    /// Walk the name and payload through a snapshot
    ///
    /// The kind tag and handle are not part of this; the registry writes
    /// the tag and derives the handle from the slot.
    fn do_state(&mut self, p: &mut StateWrap<'_>) -> hle_savestate::Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Objects whose kind is known statically
///
/// Required for typed lookups such as `KernelObjectPool::get_as`.
pub trait TypedObject: KernelObject + Sized {
    const KIND: ObjectKind;
}

/// Kind-specific state carried by an [`Object`]
pub trait Payload: Serialize + DeserializeOwned + Default + fmt::Debug + 'static {
    /// Kind of every object carrying this payload
    const KIND: ObjectKind;

    /// Current layout version of this payload's section
    const VERSION: u32 = 1;

    /// Oldest layout version this build still reads
    const MIN_VERSION: u32 = 1;

    /// One-line status for diagnostics
    fn quick_info(&self) -> String {
        String::from("-")
    }
}

/// A kernel object of the kind fixed by `P`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object<P> {
    handle: Handle,
    name: String,
    payload: P,
}

impl<P: Payload> Object<P> {
    /// Create an unregistered object
    ///
    /// Names longer than [`MAX_NAME_LEN`] characters are truncated.
    pub fn new(name: &str, payload: P) -> Self {
        Self {
            handle: Handle::NONE,
            name: clamp_name(name),
            payload,
        }
    }

    /// Create an unregistered object, boxed for the registry
    pub fn boxed(name: &str, payload: P) -> Box<dyn KernelObject> {
        Box::new(Self::new(name, payload))
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }
}

impl<P: Payload> KernelObject for Object<P> {
    fn handle(&self) -> Handle {
        self.handle
    }

    fn set_handle(&mut self, handle: Handle) {
        self.handle = handle;
    }

    fn kind(&self) -> ObjectKind {
        P::KIND
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn quick_info(&self) -> String {
        self.payload.quick_info()
    }

    fn do_state(&mut self, p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        p.section(P::KIND.name(), P::MIN_VERSION, P::VERSION, |p, _| {
            p.value(&mut self.name)?;
            if p.is_reading() && self.name.chars().count() > MAX_NAME_LEN {
                self.name = clamp_name(&self.name);
            }
            p.value(&mut self.payload)
        })?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn clamp_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}

impl<P: Payload> TypedObject for Object<P> {
    const KIND: ObjectKind = P::KIND;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Semaphore, SemaphoreState};

    #[test]
    fn test_handle_sentinel() {
        assert!(Handle::NONE.is_none());
        assert!(!Handle::from_raw(0x100).is_none());
        assert_eq!(u32::from(Handle::from_raw(0x123)), 0x123);
    }

    #[test]
    fn test_name_truncated() {
        let long = "a".repeat(64);
        let sema = Semaphore::new(&long, SemaphoreState::default());
        assert_eq!(sema.name().len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_restored_name_truncated() {
        // Written by hand, bypassing Object::new
        let mut w = StateWrap::writer();
        w.section("Semaphore", 1, 1, |p, _| {
            p.value(&mut "b".repeat(64))?;
            p.value(&mut SemaphoreState::default())
        })
        .unwrap();
        let bytes = w.into_bytes();

        let mut restored = Semaphore::default();
        let mut r = StateWrap::reader(&bytes);
        restored.do_state(&mut r).unwrap();
        assert_eq!(restored.name(), "b".repeat(MAX_NAME_LEN));
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_new_object_is_unregistered() {
        let sema = Semaphore::new("sema", SemaphoreState::default());
        assert!(sema.handle().is_none());
        assert_eq!(sema.kind(), ObjectKind::Semaphore);
        assert_eq!(sema.type_name(), "Semaphore");
    }

    #[test]
    fn test_object_state_round_trip() {
        let mut original = Semaphore::new(
            "vblank",
            SemaphoreState {
                count: 2,
                max_count: 4,
                ..Default::default()
            },
        );
        let mut w = StateWrap::writer();
        original.do_state(&mut w).unwrap();
        let bytes = w.into_bytes();

        let mut restored = Semaphore::default();
        let mut r = StateWrap::reader(&bytes);
        restored.do_state(&mut r).unwrap();
        assert_eq!(restored.name(), "vblank");
        assert_eq!(restored.payload(), original.payload());
    }

    #[test]
    fn test_section_titled_by_kind() {
        let mut sema = Semaphore::new("s", SemaphoreState::default());
        let mut w = StateWrap::writer();
        sema.do_state(&mut w).unwrap();
        let sections = hle_savestate::scan_sections(&w.into_bytes()).unwrap();
        assert_eq!(sections[0].title, "Semaphore");
    }
}
