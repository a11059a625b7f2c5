//! Kind-tag to blank-object construction, used by snapshot restore

use crate::kind::ObjectKind;
use crate::kinds::*;
use crate::object::KernelObject;

/// Builds blank objects for a raw kind discriminant
///
/// Returning `None` means the discriminant is not known to this build. A
/// restore treats that as fatal.
pub trait ObjectFactory {
    fn create_by_kind(&self, raw: u32) -> Option<Box<dyn KernelObject>>;
}

/// Factory covering every built-in [`ObjectKind`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFactory;

impl ObjectFactory for BuiltinFactory {
    fn create_by_kind(&self, raw: u32) -> Option<Box<dyn KernelObject>> {
        match ObjectKind::from_raw(raw) {
            Some(kind) => Some(blank_object(kind)),
            None => {
                log::error!("Unable to load state: could not find object type {}", raw);
                None
            }
        }
    }
}

/// Default-initialised, unregistered object of `kind`
pub fn blank_object(kind: ObjectKind) -> Box<dyn KernelObject> {
    match kind {
        ObjectKind::Thread => Box::<Thread>::default(),
        ObjectKind::Semaphore => Box::<Semaphore>::default(),
        ObjectKind::EventFlag => Box::<EventFlag>::default(),
        ObjectKind::Mbox => Box::<Mbox>::default(),
        ObjectKind::Vpl => Box::<Vpl>::default(),
        ObjectKind::Fpl => Box::<Fpl>::default(),
        ObjectKind::MsgPipe => Box::<MsgPipe>::default(),
        ObjectKind::Callback => Box::<Callback>::default(),
        ObjectKind::ThreadEventHandler => Box::<ThreadEventHandler>::default(),
        ObjectKind::Alarm => Box::<Alarm>::default(),
        ObjectKind::VTimer => Box::<VTimer>::default(),
        ObjectKind::Mutex => Box::<Mutex>::default(),
        ObjectKind::LwMutex => Box::<LwMutex>::default(),
        ObjectKind::Tlspl => Box::<Tlspl>::default(),
        ObjectKind::Module => Box::<Module>::default(),
        ObjectKind::MemoryBlock => Box::<MemoryBlock>::default(),
        ObjectKind::File => Box::<File>::default(),
        ObjectKind::DirListing => Box::<DirListing>::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::LEGACY_TLSPL_KIND;

    #[test]
    fn test_every_kind_constructs_itself() {
        for kind in ObjectKind::ALL {
            let object = BuiltinFactory.create_by_kind(kind.raw()).unwrap();
            assert_eq!(object.kind(), kind);
            assert!(object.handle().is_none());
        }
    }

    #[test]
    fn test_legacy_tlspl() {
        let object = BuiltinFactory.create_by_kind(LEGACY_TLSPL_KIND).unwrap();
        assert_eq!(object.kind(), ObjectKind::Tlspl);
    }

    #[test]
    fn test_unknown_kind() {
        assert!(BuiltinFactory.create_by_kind(0xDEAD).is_none());
    }
}
