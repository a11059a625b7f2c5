//! Subsystem seam and fixed sequencing tables
//!
//! The kernel drives every HLE subsystem through the [`Subsystem`] trait. The
//! order in which they are brought up, torn down and snapshotted is fixed
//! here and never depends on registration order.

use hle_kobj::KernelObjectPool;
use hle_savestate::StateWrap;
use thiserror::Error;

use crate::config::KernelConfig;
use crate::timing::EventScheduler;

/// Identity of an HLE subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubsystemId {
    Time,
    Interrupts,
    Memory,
    Threading,
    Alarm,
    VTimer,
    EventFlag,
    Mbx,
    Mutex,
    Sema,
    MsgPipe,
    Module,
    Io,
    Jpeg,
    Audio,
    Mp3,
    Sas,
    Atrac,
    Ccc,
    Display,
    Ge,
    Power,
    Utility,
    Umd,
    Mpeg,
    Psmf,
    PsmfPlayer,
    Ctrl,
    Rtc,
    Ssl,
    Impose,
    Usb,
    Font,
    Net,
    NetAdhoc,
    NetAdhocMatching,
    Vaudio,
    Cheat,
    Heap,
    Dmac,
    AudioCodec,
    VideoPmp,
    Aac,
    UsbGps,
    UsbCam,
    UsbMic,
    OpenPsid,
    Http,
    Np,
    Reg,
    SaveState,
    Reporting,
    PpGe,
}

/// Bring-up order
///
/// Time and interrupts first, memory before threading, synchronisation
/// primitives before I/O, I/O before media and peripherals. The drawing
/// helper comes last because it needs memory, display and fonts.
pub const INIT_ORDER: &[SubsystemId] = &[
    SubsystemId::Time,
    SubsystemId::Interrupts,
    SubsystemId::Memory,
    SubsystemId::Threading,
    SubsystemId::Alarm,
    SubsystemId::VTimer,
    SubsystemId::EventFlag,
    SubsystemId::Mbx,
    SubsystemId::Mutex,
    SubsystemId::Sema,
    SubsystemId::MsgPipe,
    SubsystemId::Io,
    SubsystemId::Jpeg,
    SubsystemId::Audio,
    SubsystemId::Mp3,
    SubsystemId::Sas,
    SubsystemId::Atrac,
    SubsystemId::Ccc,
    SubsystemId::Display,
    SubsystemId::Ge,
    SubsystemId::Power,
    SubsystemId::Utility,
    SubsystemId::Umd,
    SubsystemId::Mpeg,
    SubsystemId::Psmf,
    SubsystemId::Ctrl,
    SubsystemId::Rtc,
    SubsystemId::Ssl,
    SubsystemId::Impose,
    SubsystemId::Usb,
    SubsystemId::Font,
    SubsystemId::Net,
    SubsystemId::NetAdhoc,
    SubsystemId::NetAdhocMatching,
    SubsystemId::Vaudio,
    SubsystemId::Cheat,
    SubsystemId::Heap,
    SubsystemId::Dmac,
    SubsystemId::AudioCodec,
    SubsystemId::VideoPmp,
    SubsystemId::UsbGps,
    SubsystemId::UsbCam,
    SubsystemId::UsbMic,
    SubsystemId::OpenPsid,
    SubsystemId::Http,
    SubsystemId::Np,
    SubsystemId::Reg,
    // Save states may create directories, so after I/O
    SubsystemId::SaveState,
    SubsystemId::Reporting,
    SubsystemId::PpGe,
];

/// Tear-down order, run after the object pool has been cleared
///
/// Roughly the reverse of [`INIT_ORDER`]. Synchronisation primitives go
/// before threading, threading before memory, interrupts and time near the
/// end. Together with [`LATE_SHUTDOWN_ORDER`] it covers every initialized id.
pub const SHUTDOWN_ORDER: &[SubsystemId] = &[
    SubsystemId::Reg,
    SubsystemId::Np,
    SubsystemId::Http,
    SubsystemId::OpenPsid,
    SubsystemId::UsbCam,
    SubsystemId::UsbMic,
    SubsystemId::UsbGps,
    SubsystemId::AudioCodec,
    SubsystemId::VideoPmp,
    SubsystemId::Aac,
    SubsystemId::Dmac,
    SubsystemId::Vaudio,
    SubsystemId::NetAdhoc,
    SubsystemId::NetAdhocMatching,
    SubsystemId::Net,
    SubsystemId::Usb,
    SubsystemId::Impose,
    SubsystemId::Ssl,
    SubsystemId::Font,
    SubsystemId::Rtc,
    SubsystemId::Mp3,
    SubsystemId::Mpeg,
    SubsystemId::Psmf,
    SubsystemId::PpGe,
    SubsystemId::Ctrl,
    SubsystemId::Umd,
    SubsystemId::Utility,
    SubsystemId::Power,
    SubsystemId::Ge,
    SubsystemId::Sas,
    SubsystemId::Display,
    SubsystemId::Ccc,
    SubsystemId::Atrac,
    SubsystemId::Audio,
    SubsystemId::Jpeg,
    SubsystemId::Io,
    SubsystemId::Heap,
    SubsystemId::MsgPipe,
    SubsystemId::Sema,
    SubsystemId::Mutex,
    SubsystemId::Mbx,
    SubsystemId::EventFlag,
    SubsystemId::VTimer,
    SubsystemId::Alarm,
    SubsystemId::Threading,
    SubsystemId::Memory,
    SubsystemId::Interrupts,
    SubsystemId::Time,
    SubsystemId::Cheat,
    SubsystemId::Module,
];

/// Shut down after the timed-event queue has been cleared
pub const LATE_SHUTDOWN_ORDER: &[SubsystemId] = &[SubsystemId::Reporting, SubsystemId::SaveState];

/// Snapshot order inside the "Kernel Modules" section
///
/// Memory comes after the object pool, whose clear may release memory.
pub const KERNEL_MODULE_STATE_ORDER: &[SubsystemId] = &[
    SubsystemId::Interrupts,
    SubsystemId::Memory,
    SubsystemId::Threading,
    SubsystemId::Alarm,
    SubsystemId::VTimer,
    SubsystemId::EventFlag,
    SubsystemId::Mbx,
    SubsystemId::Module,
    SubsystemId::MsgPipe,
    SubsystemId::Mutex,
    SubsystemId::Sema,
    SubsystemId::Time,
];

/// Snapshot order inside the "HLE Modules" section; new entries go last
pub const HLE_MODULE_STATE_ORDER: &[SubsystemId] = &[
    SubsystemId::Atrac,
    SubsystemId::Audio,
    SubsystemId::Ccc,
    SubsystemId::Ctrl,
    SubsystemId::Display,
    SubsystemId::Font,
    SubsystemId::Ge,
    SubsystemId::Impose,
    SubsystemId::Io,
    SubsystemId::Jpeg,
    SubsystemId::Mp3,
    SubsystemId::Mpeg,
    SubsystemId::Net,
    SubsystemId::NetAdhoc,
    SubsystemId::Power,
    SubsystemId::Psmf,
    SubsystemId::PsmfPlayer,
    SubsystemId::Rtc,
    SubsystemId::Sas,
    SubsystemId::Ssl,
    SubsystemId::Umd,
    SubsystemId::Utility,
    SubsystemId::Usb,
    SubsystemId::Vaudio,
    SubsystemId::Heap,
    SubsystemId::PpGe,
    SubsystemId::Cheat,
    SubsystemId::AudioCodec,
    SubsystemId::VideoPmp,
    SubsystemId::Aac,
    SubsystemId::UsbGps,
    SubsystemId::UsbMic,
    SubsystemId::Reg,
];

/// Late-pass snapshot order inside the "Kernel Cleanup" section
pub const LATE_STATE_ORDER: &[SubsystemId] = &[
    SubsystemId::Interrupts,
    SubsystemId::Threading,
    SubsystemId::Reporting,
];

/// Failure reported by a subsystem's init or shutdown
///
/// The kernel logs these and carries on with the next subsystem.
#[derive(Debug, Error)]
pub enum SubsystemError {
    #[error("resource unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Failed(String),
}

/// What a subsystem may touch during init and shutdown
pub struct KernelContext<'a> {
    pub pool: &'a mut KernelObjectPool,
    pub events: &'a mut EventScheduler,
    pub config: &'a KernelConfig,
}

/// An HLE subsystem driven by the kernel lifecycle
///
/// Every method has a no-op default so a subsystem only implements the
/// phases it takes part in.
pub trait Subsystem {
    fn init(&mut self, _ctx: &mut KernelContext<'_>) -> Result<(), SubsystemError> {
        Ok(())
    }

    fn shutdown(&mut self, _ctx: &mut KernelContext<'_>) -> Result<(), SubsystemError> {
        Ok(())
    }

    /// Save or restore this subsystem's own state
    fn do_state(&mut self, _p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        Ok(())
    }

    /// Second pass, run after every other subsystem has restored
    fn do_state_late(&mut self, _p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        Ok(())
    }

    /// Short status line; only the threading subsystem's is shown
    fn summary(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn position(order: &[SubsystemId], id: SubsystemId) -> usize {
        order.iter().position(|&entry| entry == id).unwrap()
    }

    #[test]
    fn test_orders_have_no_duplicates() {
        for order in [
            INIT_ORDER,
            SHUTDOWN_ORDER,
            KERNEL_MODULE_STATE_ORDER,
            HLE_MODULE_STATE_ORDER,
            LATE_STATE_ORDER,
        ] {
            let unique: HashSet<_> = order.iter().collect();
            assert_eq!(unique.len(), order.len());
        }
    }

    #[test]
    fn test_init_dependencies() {
        assert_eq!(INIT_ORDER[0], SubsystemId::Time);
        assert_eq!(*INIT_ORDER.last().unwrap(), SubsystemId::PpGe);
        assert!(position(INIT_ORDER, SubsystemId::Memory) < position(INIT_ORDER, SubsystemId::Threading));
        assert!(position(INIT_ORDER, SubsystemId::Sema) < position(INIT_ORDER, SubsystemId::Io));
        assert!(position(INIT_ORDER, SubsystemId::Io) < position(INIT_ORDER, SubsystemId::SaveState));
    }

    #[test]
    fn test_shutdown_dependencies() {
        let order = SHUTDOWN_ORDER;
        assert!(position(order, SubsystemId::Mutex) < position(order, SubsystemId::Threading));
        assert!(position(order, SubsystemId::Threading) < position(order, SubsystemId::Memory));
        assert!(position(order, SubsystemId::Memory) < position(order, SubsystemId::Interrupts));
        assert!(position(order, SubsystemId::Sema) < position(order, SubsystemId::Threading));
        assert_eq!(position(order, SubsystemId::Time), position(order, SubsystemId::Interrupts) + 1);
    }

    #[test]
    fn test_every_initialized_subsystem_shuts_down() {
        let shut: HashSet<_> = SHUTDOWN_ORDER
            .iter()
            .chain(LATE_SHUTDOWN_ORDER)
            .collect();
        let missing: Vec<_> = INIT_ORDER.iter().filter(|id| !shut.contains(id)).collect();
        assert!(missing.is_empty(), "never shut down: {:?}", missing);

        let late: HashSet<_> = LATE_SHUTDOWN_ORDER.iter().collect();
        assert!(SHUTDOWN_ORDER.iter().all(|id| !late.contains(id)));
    }

    #[test]
    fn test_memory_state_after_interrupts() {
        assert_eq!(KERNEL_MODULE_STATE_ORDER[0], SubsystemId::Interrupts);
        assert_eq!(KERNEL_MODULE_STATE_ORDER[1], SubsystemId::Memory);
    }
}
