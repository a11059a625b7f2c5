//! Object kinds - the closed set of kernel primitives
//!
//! The discriminant values are part of the save-state format. They match the
//! guest kernel's type ids where one exists; emulator-only kinds live above
//! `0x100000`.

use crate::error_codes;

/// Discriminant of the legacy TLS pool layout
///
/// Older snapshots tagged TLS pools with this value. It is accepted on
/// restore and mapped to [`ObjectKind::Tlspl`]; it is never written.
pub const LEGACY_TLSPL_KIND: u32 = 0x1001;

/// Kind of a kernel object
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// Guest thread
    Thread = 1,

    /// Counting semaphore
    Semaphore = 2,

    /// 32-bit event flag
    EventFlag = 3,

    /// Message box (linked message queue)
    Mbox = 4,

    /// Variable-length memory pool
    Vpl = 5,

    /// Fixed-length memory pool
    Fpl = 6,

    /// Byte-stream message pipe
    MsgPipe = 7,

    /// Thread callback
    Callback = 8,

    /// Thread event handler
    ThreadEventHandler = 9,

    /// One-shot alarm
    Alarm = 10,

    /// Virtual timer
    VTimer = 11,

    /// Mutex
    Mutex = 12,

    /// Lightweight (user memory) mutex
    LwMutex = 13,

    /// Thread-local storage pool
    Tlspl = 14,

    /// Loaded module
    Module = 0x10_0001,

    /// Partitioned memory block
    MemoryBlock = 0x10_0002,

    /// Open file
    File = 0x10_0003,

    /// Open directory listing
    DirListing = 0x10_0004,
}

impl ObjectKind {
    /// Every kind, in discriminant order
    pub const ALL: [ObjectKind; 18] = [
        ObjectKind::Thread,
        ObjectKind::Semaphore,
        ObjectKind::EventFlag,
        ObjectKind::Mbox,
        ObjectKind::Vpl,
        ObjectKind::Fpl,
        ObjectKind::MsgPipe,
        ObjectKind::Callback,
        ObjectKind::ThreadEventHandler,
        ObjectKind::Alarm,
        ObjectKind::VTimer,
        ObjectKind::Mutex,
        ObjectKind::LwMutex,
        ObjectKind::Tlspl,
        ObjectKind::Module,
        ObjectKind::MemoryBlock,
        ObjectKind::File,
        ObjectKind::DirListing,
    ];

    /// Raw discriminant as stored in snapshots
    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// Decode a raw discriminant
    ///
    /// Accepts [`LEGACY_TLSPL_KIND`] as an alias of [`ObjectKind::Tlspl`].
    pub fn from_raw(raw: u32) -> Option<Self> {
        if raw == LEGACY_TLSPL_KIND {
            return Some(ObjectKind::Tlspl);
        }
        Self::ALL.iter().copied().find(|kind| kind.raw() == raw)
    }

    /// Short type name used in listings and as the object's section title
    pub const fn name(self) -> &'static str {
        match self {
            ObjectKind::Thread => "Thread",
            ObjectKind::Semaphore => "Semaphore",
            ObjectKind::EventFlag => "EventFlag",
            ObjectKind::Mbox => "Mbx",
            ObjectKind::Vpl => "VPL",
            ObjectKind::Fpl => "FPL",
            ObjectKind::MsgPipe => "MsgPipe",
            ObjectKind::Callback => "CallBack",
            ObjectKind::ThreadEventHandler => "ThreadEventHandler",
            ObjectKind::Alarm => "Alarm",
            ObjectKind::VTimer => "VTimer",
            ObjectKind::Mutex => "Mutex",
            ObjectKind::LwMutex => "LwMutex",
            ObjectKind::Tlspl => "TLS",
            ObjectKind::Module => "Module",
            ObjectKind::MemoryBlock => "MemoryPart",
            ObjectKind::File => "OpenFile",
            ObjectKind::DirListing => "DirListing",
        }
    }

    /// Guest status code returned when a handle of this kind does not exist
    pub const fn missing_error_code(self) -> u32 {
        match self {
            ObjectKind::Thread => error_codes::UNKNOWN_THID,
            ObjectKind::Semaphore => error_codes::UNKNOWN_SEMID,
            ObjectKind::EventFlag => error_codes::UNKNOWN_EVFID,
            ObjectKind::Mbox => error_codes::UNKNOWN_MBXID,
            ObjectKind::Vpl => error_codes::UNKNOWN_VPLID,
            ObjectKind::Fpl => error_codes::UNKNOWN_FPLID,
            ObjectKind::MsgPipe => error_codes::UNKNOWN_MPPID,
            ObjectKind::Alarm => error_codes::UNKNOWN_ALMID,
            ObjectKind::ThreadEventHandler => error_codes::UNKNOWN_TEID,
            ObjectKind::Callback => error_codes::UNKNOWN_CBID,
            ObjectKind::Mutex => error_codes::MUTEX_NO_SUCH_MUTEX,
            ObjectKind::LwMutex => error_codes::LWMUTEX_NO_SUCH_LWMUTEX,
            ObjectKind::VTimer
            | ObjectKind::Tlspl
            | ObjectKind::Module
            | ObjectKind::MemoryBlock
            | ObjectKind::File
            | ObjectKind::DirListing => error_codes::UNKNOWN_UID,
        }
    }
}
