//! Demo kernel wiring shared by `demo` and `inspect`
//!
//! A snapshot only restores into a kernel with the same subsystems
//! registered, so both commands build their kernel here.

use anyhow::{bail, Context, Result};
use hle_kernel::{Kernel, KernelConfig, KernelContext, Subsystem, SubsystemError, SubsystemId};
use hle_kobj::{
    Alarm, AlarmState, Callback, CallbackState, DirListing, DirListingState, EventFlag,
    EventFlagState, File, FileState, Handle, KernelObject, Mutex, MutexState, Semaphore,
    SemaphoreState, Thread, ThreadState, ThreadStatus, Vpl, VplState, CAPACITY,
    DEFAULT_RANGE_BOTTOM,
};
use hle_savestate::StateWrap;

/// Guest address the demo user module is "loaded" at
const USER_BASE: u32 = 0x0880_0000;

/// Creates the idle and main threads and a reschedule timer
#[derive(Debug, Default)]
pub struct DemoThreading {
    idle: Handle,
    main: Handle,
    reschedules: u32,
}

impl Subsystem for DemoThreading {
    fn init(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), SubsystemError> {
        // The idle thread lives in the reserved low slots
        self.idle = ctx.pool.create(
            Thread::boxed(
                "idle0",
                ThreadState {
                    priority: 127,
                    status: ThreadStatus::READY.bits(),
                    ..Default::default()
                },
            ),
            0,
            DEFAULT_RANGE_BOTTOM,
        );
        self.main = ctx.pool.insert(Thread::boxed(
            "user_main",
            ThreadState {
                entry: USER_BASE + 0x104,
                priority: 32,
                stack_size: 0x4_0000,
                status: ThreadStatus::RUNNING.bits(),
                ..Default::default()
            },
        ));
        if self.idle.is_none() || self.main.is_none() {
            return Err(SubsystemError::Unavailable("no slot for the boot threads".into()));
        }

        let reschedule = ctx.events.register_event("Reschedule");
        ctx.events
            .schedule(reschedule, 10_000, u64::from(self.main.raw()))
            .map_err(|err| SubsystemError::Failed(err.to_string()))
    }

    fn shutdown(&mut self, _ctx: &mut KernelContext<'_>) -> Result<(), SubsystemError> {
        *self = Self::default();
        Ok(())
    }

    fn do_state(&mut self, p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        p.value(&mut self.idle)?;
        p.value(&mut self.main)
    }

    fn do_state_late(&mut self, p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        p.value(&mut self.reschedules)
    }

    fn summary(&self) -> Option<String> {
        if self.main.is_none() {
            return None;
        }
        Some(format!(
            "Threading: main thread {}, idle thread {}",
            self.main, self.idle
        ))
    }
}

/// Tracks the files the demo program has open
#[derive(Debug, Default)]
pub struct DemoIo {
    open_files: Vec<Handle>,
}

impl Subsystem for DemoIo {
    fn init(&mut self, ctx: &mut KernelContext<'_>) -> Result<(), SubsystemError> {
        let boot = ctx.pool.insert(File::boxed(
            "EBOOT.BIN",
            FileState {
                path: "disc0:/PSP_GAME/SYSDIR/EBOOT.BIN".into(),
                access: 1,
                ..Default::default()
            },
        ));
        if boot.is_none() {
            return Err(SubsystemError::Unavailable("no slot for the boot file".into()));
        }
        self.open_files.push(boot);
        Ok(())
    }

    fn shutdown(&mut self, _ctx: &mut KernelContext<'_>) -> Result<(), SubsystemError> {
        self.open_files.clear();
        Ok(())
    }

    fn do_state(&mut self, p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        p.value(&mut self.open_files)
    }
}

/// Build the kernel both commands operate on
pub fn kernel(config: KernelConfig) -> Kernel {
    let mut kernel = Kernel::new(config);
    kernel.register(SubsystemId::Threading, Box::<DemoThreading>::default());
    kernel.register(SubsystemId::Io, Box::<DemoIo>::default());
    kernel
}

fn insert(kernel: &mut Kernel, object: Box<dyn KernelObject>) -> Result<Handle> {
    let handle = kernel.pool_mut().create(object, DEFAULT_RANGE_BOTTOM, CAPACITY);
    if handle.is_none() {
        bail!("kernel object table is full");
    }
    Ok(handle)
}

/// Fill a booted kernel with a spread of objects, as a running game would
///
/// # Arguments
/// * `semaphores` - Number of extra semaphores to create
pub fn populate(kernel: &mut Kernel, semaphores: u32) -> Result<()> {
    for i in 0..semaphores {
        let count = i32::try_from(i % 8).unwrap_or(0);
        insert(
            kernel,
            Semaphore::boxed(
                &format!("sema{}", i),
                SemaphoreState {
                    init_count: count,
                    count,
                    max_count: 8,
                    ..Default::default()
                },
            ),
        )?;
    }

    insert(
        kernel,
        Mutex::boxed(
            "render_lock",
            MutexState {
                initial_count: 0,
                ..Default::default()
            },
        ),
    )?;
    insert(
        kernel,
        EventFlag::boxed(
            "vblank_evf",
            EventFlagState {
                init_pattern: 1,
                pattern: 1,
                ..Default::default()
            },
        ),
    )?;
    insert(
        kernel,
        Vpl::boxed(
            "heap_vpl",
            VplState {
                address: USER_BASE + 0x0100_0000,
                pool_size: 0x10_0000,
                free_size: 0x10_0000,
                ..Default::default()
            },
        ),
    )?;
    insert(
        kernel,
        Alarm::boxed(
            "watchdog",
            AlarmState {
                handler: USER_BASE + 0x2000,
                schedule: 1_000_000,
                ..Default::default()
            },
        ),
    )?;
    insert(
        kernel,
        DirListing::boxed(
            "savedata",
            DirListingState {
                path: "ms0:/PSP/SAVEDATA".into(),
                entries: vec!["ULUS10000DATA00".into(), "ULUS10000DATA01".into()],
                index: 0,
            },
        ),
    )?;

    let exit = insert(
        kernel,
        Callback::boxed(
            "ExitCallback",
            CallbackState {
                entry: USER_BASE + 0x3000,
                ..Default::default()
            },
        ),
    )?;
    kernel
        .register_exit_callback(exit)
        .context("Failed to register the exit callback")?;
    kernel.set_gpo(0x5A);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hle_kobj::ObjectKind;

    #[test]
    fn test_boot_creates_threads_and_file() {
        let mut kernel = kernel(KernelConfig::default());
        kernel.init();
        assert_eq!(kernel.pool().handles_of_kind(ObjectKind::Thread).count(), 2);
        assert_eq!(kernel.pool().handles_of_kind(ObjectKind::File).count(), 1);
        assert_eq!(kernel.events().pending_count(), 1);
    }

    #[test]
    fn test_idle_thread_in_reserved_range() {
        let mut kernel = kernel(KernelConfig::default());
        kernel.init();
        let idle = kernel
            .pool()
            .list()
            .into_iter()
            .find(|row| row.name == "idle0")
            .unwrap();
        assert!(idle.handle.raw() < hle_kobj::HANDLE_BASE + DEFAULT_RANGE_BOTTOM as u32);
    }

    #[test]
    fn test_populate_and_round_trip() {
        let mut source = kernel(KernelConfig::default());
        source.init();
        populate(&mut source, 3).unwrap();
        assert_eq!(source.pool().count(), 2 + 1 + 3 + 6);
        assert!(source.state().exit_callback().is_some());

        let bytes = source.save_state().unwrap();
        let mut target = kernel(KernelConfig::default());
        target.load_state(&bytes).unwrap();
        assert_eq!(target.pool().list(), source.pool().list());
        assert_eq!(target.summarize(), source.summarize());
        assert_eq!(target.state().exit_callback(), source.state().exit_callback());
    }

    #[test]
    fn test_summary_before_boot() {
        let kernel = kernel(KernelConfig::default());
        assert_eq!(kernel.summarize(), "Stopped: 0 kernel objects");
    }
}
