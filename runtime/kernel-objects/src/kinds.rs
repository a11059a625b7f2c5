//! Concrete kernel object kinds
//!
//! Each kind is an [`Object`] carrying a kind-specific payload. The payloads
//! hold the state a subsystem needs to resume the object after a restore;
//! wait/wake behaviour lives in the owning subsystem, not here.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::kind::ObjectKind;
use crate::object::{Handle, Object, Payload};

bitflags! {
    /// Scheduler state of a guest thread
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ThreadStatus: u32 {
        const RUNNING = 1 << 0;
        const READY = 1 << 1;
        const WAIT = 1 << 2;
        const SUSPEND = 1 << 3;
        const DORMANT = 1 << 4;
        const DEAD = 1 << 5;
        const WAITSUSPEND = Self::WAIT.bits() | Self::SUSPEND.bits();
    }
}

/// Guest thread
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    pub entry: u32,
    pub priority: u32,
    pub stack_size: u32,
    pub attr: u32,
    /// Raw [`ThreadStatus`] bits
    pub status: u32,
    pub exit_status: i32,
    pub wait_type: u32,
    pub wait_id: Handle,
}

impl ThreadState {
    pub fn status(&self) -> ThreadStatus {
        ThreadStatus::from_bits_truncate(self.status)
    }

    pub fn set_status(&mut self, status: ThreadStatus) {
        self.status = status.bits();
    }
}

impl Payload for ThreadState {
    const KIND: ObjectKind = ObjectKind::Thread;

    fn quick_info(&self) -> String {
        format!(
            "pc={:08x} prio={} status={:?}",
            self.entry,
            self.priority,
            self.status()
        )
    }
}

/// Counting semaphore
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemaphoreState {
    pub attr: u32,
    pub init_count: i32,
    pub count: i32,
    pub max_count: i32,
    pub waiting_threads: Vec<Handle>,
}

impl Payload for SemaphoreState {
    const KIND: ObjectKind = ObjectKind::Semaphore;

    fn quick_info(&self) -> String {
        format!(
            "init={} cur={} max={} waiting={}",
            self.init_count,
            self.count,
            self.max_count,
            self.waiting_threads.len()
        )
    }
}

/// 32-bit event flag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFlagState {
    pub attr: u32,
    pub init_pattern: u32,
    pub pattern: u32,
    pub waiting_threads: Vec<Handle>,
}

impl Payload for EventFlagState {
    const KIND: ObjectKind = ObjectKind::EventFlag;

    fn quick_info(&self) -> String {
        format!("init={:08x} cur={:08x}", self.init_pattern, self.pattern)
    }
}

/// Message box
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MboxState {
    pub attr: u32,
    pub num_messages: u32,
    pub first_message: u32,
    pub waiting_threads: Vec<Handle>,
}

impl Payload for MboxState {
    const KIND: ObjectKind = ObjectKind::Mbox;

    fn quick_info(&self) -> String {
        format!("messages={}", self.num_messages)
    }
}

/// Variable-length memory pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VplState {
    pub attr: u32,
    pub address: u32,
    pub pool_size: u32,
    pub free_size: u32,
    pub waiting_threads: Vec<Handle>,
}

impl Payload for VplState {
    const KIND: ObjectKind = ObjectKind::Vpl;

    fn quick_info(&self) -> String {
        format!("free={}/{}", self.free_size, self.pool_size)
    }
}

/// Fixed-length memory pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FplState {
    pub attr: u32,
    pub address: u32,
    pub block_size: u32,
    pub blocks: Vec<bool>,
    pub waiting_threads: Vec<Handle>,
}

impl Payload for FplState {
    const KIND: ObjectKind = ObjectKind::Fpl;

    fn quick_info(&self) -> String {
        let used = self.blocks.iter().filter(|&&used| used).count();
        format!("used={}/{} size={}", used, self.blocks.len(), self.block_size)
    }
}

/// Byte-stream message pipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MsgPipeState {
    pub attr: u32,
    pub buffer_addr: u32,
    pub buffer_size: u32,
    pub free_size: u32,
    pub send_waiting: Vec<Handle>,
    pub receive_waiting: Vec<Handle>,
}

impl Payload for MsgPipeState {
    const KIND: ObjectKind = ObjectKind::MsgPipe;

    fn quick_info(&self) -> String {
        format!("free={}/{}", self.free_size, self.buffer_size)
    }
}

/// Thread callback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallbackState {
    pub entry: u32,
    pub common_arg: u32,
    pub thread: Handle,
    pub notify_count: u32,
    pub notify_arg: u32,
}

impl Payload for CallbackState {
    const KIND: ObjectKind = ObjectKind::Callback;

    fn quick_info(&self) -> String {
        format!("thread={} notified={}", self.thread, self.notify_count)
    }
}

/// Thread event handler
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadEventHandlerState {
    pub thread: Handle,
    pub mask: u32,
    pub handler: u32,
    pub common_arg: u32,
}

impl Payload for ThreadEventHandlerState {
    const KIND: ObjectKind = ObjectKind::ThreadEventHandler;
}

/// One-shot alarm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlarmState {
    pub handler: u32,
    pub common_arg: u32,
    pub schedule: u64,
}

impl Payload for AlarmState {
    const KIND: ObjectKind = ObjectKind::Alarm;

    fn quick_info(&self) -> String {
        format!("at={}", self.schedule)
    }
}

/// Virtual timer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VTimerState {
    pub active: bool,
    pub base: u64,
    pub current: u64,
    pub schedule: u64,
    pub handler: u32,
    pub common_arg: u32,
}

impl Payload for VTimerState {
    const KIND: ObjectKind = ObjectKind::VTimer;

    fn quick_info(&self) -> String {
        format!("active={} current={}", self.active, self.current)
    }
}

/// Mutex
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutexState {
    pub attr: u32,
    pub initial_count: i32,
    pub lock_level: i32,
    pub lock_thread: Handle,
    pub waiting_threads: Vec<Handle>,
}

impl Payload for MutexState {
    const KIND: ObjectKind = ObjectKind::Mutex;

    fn quick_info(&self) -> String {
        format!("level={} owner={}", self.lock_level, self.lock_thread)
    }
}

/// Lightweight mutex backed by guest memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LwMutexState {
    pub attr: u32,
    pub workarea: u32,
    pub lock_level: i32,
    pub lock_thread: Handle,
    pub waiting_threads: Vec<Handle>,
}

impl Payload for LwMutexState {
    const KIND: ObjectKind = ObjectKind::LwMutex;

    fn quick_info(&self) -> String {
        format!("workarea={:08x} level={}", self.workarea, self.lock_level)
    }
}

/// Thread-local storage pool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TlsplState {
    pub attr: u32,
    pub address: u32,
    pub block_size: u32,
    pub usage: Vec<Handle>,
    pub waiting_threads: Vec<Handle>,
}

impl Payload for TlsplState {
    const KIND: ObjectKind = ObjectKind::Tlspl;

    fn quick_info(&self) -> String {
        let used = self.usage.iter().filter(|h| !h.is_none()).count();
        format!("used={}/{}", used, self.usage.len())
    }
}

/// Loaded module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleState {
    pub version: (u8, u8),
    pub attribute: u16,
    pub entry_addr: u32,
    pub gp_value: u32,
    pub text_addr: u32,
    pub text_size: u32,
    pub stopped: bool,
}

impl Payload for ModuleState {
    const KIND: ObjectKind = ObjectKind::Module;

    fn quick_info(&self) -> String {
        format!(
            "v{}.{} text={:08x}+{:x}",
            self.version.0, self.version.1, self.text_addr, self.text_size
        )
    }
}

/// Partitioned memory block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryBlockState {
    pub partition: u32,
    pub address: u32,
    pub size: u32,
    pub alloc_type: u32,
}

impl Payload for MemoryBlockState {
    const KIND: ObjectKind = ObjectKind::MemoryBlock;

    fn quick_info(&self) -> String {
        format!("{:08x}+{:x} part={}", self.address, self.size, self.partition)
    }
}

/// Open file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileState {
    pub path: String,
    pub access: u32,
    pub position: u64,
    pub async_busy: bool,
}

impl Payload for FileState {
    const KIND: ObjectKind = ObjectKind::File;

    fn quick_info(&self) -> String {
        format!("{} @{}", self.path, self.position)
    }
}

/// Open directory listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirListingState {
    pub path: String,
    pub entries: Vec<String>,
    pub index: u32,
}

impl Payload for DirListingState {
    const KIND: ObjectKind = ObjectKind::DirListing;

    fn quick_info(&self) -> String {
        format!("{} {}/{}", self.path, self.index, self.entries.len())
    }
}

pub type Thread = Object<ThreadState>;
pub type Semaphore = Object<SemaphoreState>;
pub type EventFlag = Object<EventFlagState>;
pub type Mbox = Object<MboxState>;
pub type Vpl = Object<VplState>;
pub type Fpl = Object<FplState>;
pub type MsgPipe = Object<MsgPipeState>;
pub type Callback = Object<CallbackState>;
pub type ThreadEventHandler = Object<ThreadEventHandlerState>;
pub type Alarm = Object<AlarmState>;
pub type VTimer = Object<VTimerState>;
pub type Mutex = Object<MutexState>;
pub type LwMutex = Object<LwMutexState>;
pub type Tlspl = Object<TlsplState>;
pub type Module = Object<ModuleState>;
pub type MemoryBlock = Object<MemoryBlockState>;
pub type File = Object<FileState>;
pub type DirListing = Object<DirListingState>;
