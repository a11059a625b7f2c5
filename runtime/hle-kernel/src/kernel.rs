//! Kernel lifecycle orchestrator
//!
//! Owns the object pool, the timed-event queue, the process-wide state and
//! every registered subsystem. `init` and `shutdown` walk the subsystems in
//! the fixed orders from [`crate::subsystem`]; `do_state` walks them in the
//! snapshot orders.

use std::collections::HashMap;

use hle_kobj::{BuiltinFactory, Callback, Handle, KernelObjectPool, ObjectFactory};
use hle_savestate::{StateWrap, Stateful};

use crate::config::KernelConfig;
use crate::state::KernelState;
use crate::subsystem::{
    KernelContext, Subsystem, SubsystemId, HLE_MODULE_STATE_ORDER, INIT_ORDER,
    KERNEL_MODULE_STATE_ORDER, LATE_SHUTDOWN_ORDER, LATE_STATE_ORDER, SHUTDOWN_ORDER,
};
use crate::timing::EventScheduler;

/// Current version of the "Kernel" section
///
/// Version 2 added the exit-callback handle.
pub const KERNEL_SECTION_VERSION: u32 = 2;

/// Top-level snapshot sections, in the order they are written
pub const STATE_SECTIONS: [&str; 4] = ["Kernel", "Kernel Modules", "HLE Modules", "Kernel Cleanup"];

#[derive(Debug, Clone, Copy)]
enum Phase {
    Init,
    Shutdown,
}

/// The emulated kernel
pub struct Kernel {
    config: KernelConfig,
    state: KernelState,
    pool: KernelObjectPool,
    events: EventScheduler,
    subsystems: HashMap<SubsystemId, Box<dyn Subsystem>>,
    factory: Box<dyn ObjectFactory>,
}

impl Kernel {
    /// Create a stopped kernel with no subsystems registered
    pub fn new(config: KernelConfig) -> Self {
        Self {
            config,
            state: KernelState::default(),
            pool: KernelObjectPool::new(),
            events: EventScheduler::new(),
            subsystems: HashMap::new(),
            factory: Box::new(BuiltinFactory),
        }
    }

    /// Replace the factory used to rebuild objects on restore
    pub fn set_factory(&mut self, factory: Box<dyn ObjectFactory>) {
        self.factory = factory;
    }

    /// Register a subsystem under `id`
    ///
    /// A subsystem registered while the kernel is running is initialized
    /// immediately, so it gets the same init/shutdown pairing as the rest.
    ///
    /// # Returns
    /// The subsystem previously registered under `id`, if any. It is handed
    /// back as is; its `shutdown` is not called.
    pub fn register(
        &mut self,
        id: SubsystemId,
        mut subsystem: Box<dyn Subsystem>,
    ) -> Option<Box<dyn Subsystem>> {
        if self.state.is_running() {
            log::warn!("Registering {:?} while the kernel is running; initializing it now", id);
            let mut ctx = KernelContext {
                pool: &mut self.pool,
                events: &mut self.events,
                config: &self.config,
            };
            if let Err(err) = subsystem.init(&mut ctx) {
                log::error!("{:?} {:?} failed: {}", id, Phase::Init, err);
            }
        }
        self.subsystems.insert(id, subsystem)
    }

    pub fn subsystem(&self, id: SubsystemId) -> Option<&dyn Subsystem> {
        self.subsystems.get(&id).map(|subsystem| &**subsystem)
    }

    /// Bring the kernel up
    ///
    /// Does nothing if the kernel is already running. Subsystem failures are
    /// logged; the remaining subsystems still initialize.
    pub fn init(&mut self) {
        if self.state.is_running() {
            log::error!("Can't init kernel when kernel is running");
            return;
        }
        log::info!("Initializing kernel...");

        self.state.prepare(self.config.gpi_switches);
        self.run_phase(INIT_ORDER, Phase::Init);

        self.state.set_running(true);
        log::info!("Kernel initialized.");
    }

    /// Tear the kernel down
    ///
    /// Does nothing if the kernel is stopped. Every live object is dropped
    /// before any subsystem shuts down; no per-kind teardown runs.
    pub fn shutdown(&mut self) {
        if !self.state.is_running() {
            log::info!("Can't shut down kernel - not running");
            return;
        }
        self.pool.list();
        log::info!("Shutting down kernel - {} kernel objects alive", self.pool.count());
        self.pool.clear();

        self.run_phase(SHUTDOWN_ORDER, Phase::Shutdown);

        self.events.clear_pending();
        self.events.unregister_all();
        self.run_phase(LATE_SHUTDOWN_ORDER, Phase::Shutdown);

        self.state.reset();
    }

    fn run_phase(&mut self, order: &[SubsystemId], phase: Phase) {
        for &id in order {
            let Some(subsystem) = self.subsystems.get_mut(&id) else {
                continue;
            };
            let mut ctx = KernelContext {
                pool: &mut self.pool,
                events: &mut self.events,
                config: &self.config,
            };
            let result = match phase {
                Phase::Init => subsystem.init(&mut ctx),
                Phase::Shutdown => subsystem.shutdown(&mut ctx),
            };
            if let Err(err) = result {
                log::error!("{:?} {:?} failed: {}", id, phase, err);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Short status line for diagnostics
    pub fn summarize(&self) -> String {
        if let Some(summary) = self
            .subsystems
            .get(&SubsystemId::Threading)
            .and_then(|threading| threading.summary())
        {
            return summary;
        }
        let status = if self.state.is_running() {
            "Running"
        } else {
            "Stopped"
        };
        format!("{}: {} kernel objects", status, self.pool.count())
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn state(&self) -> &KernelState {
        &self.state
    }

    pub fn pool(&self) -> &KernelObjectPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut KernelObjectPool {
        &mut self.pool
    }

    pub fn events(&self) -> &EventScheduler {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventScheduler {
        &mut self.events
    }

    /// Write the debug LED register
    pub fn set_gpo(&mut self, bits: u32) {
        log::debug!("GPO set to {:08x}", bits);
        self.state.set_gpo(bits);
    }

    /// Read the developer switch register
    pub fn gpi(&self) -> u32 {
        self.state.gpi()
    }

    /// Devkit version derived from the configured firmware
    pub fn devkit_version(&self) -> u32 {
        let (major, minor, revision) = self.config.firmware_triplet();
        log::debug!("Devkit version {}.{}.{}", major, minor, revision);
        self.config.devkit_version()
    }

    /// Record the callback to notify when the guest is asked to exit
    ///
    /// # Errors
    /// Fails if `handle` does not name a live callback object.
    pub fn register_exit_callback(&mut self, handle: Handle) -> hle_kobj::Result<()> {
        self.pool.get_as::<Callback>(handle)?;
        log::debug!("Registered exit callback {}", handle);
        self.state.set_exit_callback(handle);
        Ok(())
    }

    /// Save or restore the full kernel: state, objects and every subsystem
    ///
    /// A restore drops every live object before anything is validated.
    ///
    /// # Errors
    /// Any framing, structural or codec failure. A failed restore leaves the
    /// object pool empty, no exit callback registered, and the subsystems in
    /// whatever state they reached.
    pub fn do_state(&mut self, p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        if p.is_reading() {
            self.pool.clear();
        }
        let result = self.walk_sections(p);
        if result.is_err() && p.is_reading() {
            self.pool.clear();
            // Any restored exit callback named an object that is now gone
            self.state.set_exit_callback(Handle::NONE);
        }
        result
    }

    fn walk_sections(&mut self, p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        let Self {
            state,
            pool,
            subsystems,
            factory,
            ..
        } = self;

        p.section(STATE_SECTIONS[0], 1, KERNEL_SECTION_VERSION, |p, version| {
            p.value(state.running_mut())?;
            pool.do_state_with(p, &**factory)?;
            if version >= 2 {
                p.value(state.exit_callback_mut())?;
            } else {
                state.set_exit_callback(Handle::NONE);
            }
            Ok(())
        })?;

        p.section(STATE_SECTIONS[1], 1, 1, |p, _| {
            walk_subsystems(subsystems, KERNEL_MODULE_STATE_ORDER, p, false)
        })?;
        p.section(STATE_SECTIONS[2], 1, 1, |p, _| {
            walk_subsystems(subsystems, HLE_MODULE_STATE_ORDER, p, false)
        })?;
        p.section(STATE_SECTIONS[3], 1, 1, |p, _| {
            walk_subsystems(subsystems, LATE_STATE_ORDER, p, true)
        })?;
        Ok(())
    }

    /// Produce a full snapshot
    pub fn save_state(&mut self) -> hle_savestate::Result<Vec<u8>> {
        let mut w = StateWrap::writer();
        self.do_state(&mut w)?;
        let bytes = w.into_bytes();
        log::info!(
            "Saved kernel state: {} bytes, {} kernel objects",
            bytes.len(),
            self.pool.count()
        );
        Ok(bytes)
    }

    /// Size in bytes that `save_state` would produce
    pub fn measure_state(&mut self) -> hle_savestate::Result<usize> {
        let mut m = StateWrap::measurer();
        self.do_state(&mut m)?;
        Ok(m.position())
    }

    /// Restore a snapshot produced by `save_state`
    pub fn load_state(&mut self, bytes: &[u8]) -> hle_savestate::Result<()> {
        let mut r = StateWrap::reader(bytes);
        if let Err(err) = self.do_state(&mut r) {
            if err.is_structural() {
                log::error!("Unable to load state, snapshot is from an incompatible build: {}", err);
            } else {
                log::error!("Unable to load state: {}", err);
            }
            return Err(err);
        }
        if r.remaining() > 0 {
            log::warn!("{} trailing bytes after kernel state", r.remaining());
        }
        log::info!("Loaded kernel state: {} kernel objects", self.pool.count());
        Ok(())
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

impl Stateful for Kernel {
    fn do_state(&mut self, p: &mut StateWrap<'_>) -> hle_savestate::Result<()> {
        Kernel::do_state(self, p)
    }
}

/// Walk registered subsystems in `order`, each inside a section named by its id
fn walk_subsystems(
    subsystems: &mut HashMap<SubsystemId, Box<dyn Subsystem>>,
    order: &[SubsystemId],
    p: &mut StateWrap<'_>,
    late: bool,
) -> hle_savestate::Result<()> {
    for &id in order {
        let Some(subsystem) = subsystems.get_mut(&id) else {
            continue;
        };
        let title = format!("{:?}", id);
        p.section(&title, 1, 1, |p, _| {
            if late {
                subsystem.do_state_late(p)
            } else {
                subsystem.do_state(p)
            }
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subsystem::SubsystemError;
    use hle_kobj::{CallbackState, Semaphore, SemaphoreState, CAPACITY};

    struct Failing;

    impl Subsystem for Failing {
        fn init(&mut self, _ctx: &mut KernelContext<'_>) -> Result<(), SubsystemError> {
            Err(SubsystemError::Unavailable("no device".into()))
        }
    }

    #[test]
    fn test_init_sets_running_and_resets_gpo() {
        let mut kernel = Kernel::new(KernelConfig {
            gpi_switches: 0x5,
            ..Default::default()
        });
        kernel.set_gpo(0xAA);
        kernel.init();
        assert!(kernel.is_running());
        assert_eq!(kernel.state().gpo(), 0);
        assert_eq!(kernel.gpi(), 0x5);
    }

    #[test]
    fn test_failing_subsystem_does_not_abort_init() {
        let mut kernel = Kernel::default();
        kernel.register(SubsystemId::Io, Box::new(Failing));
        kernel.init();
        assert!(kernel.is_running());
    }

    #[test]
    fn test_summary_fallback() {
        let mut kernel = Kernel::default();
        assert_eq!(kernel.summarize(), "Stopped: 0 kernel objects");
        kernel.init();
        kernel
            .pool_mut()
            .create(Semaphore::boxed("s", SemaphoreState::default()), 0, CAPACITY);
        assert_eq!(kernel.summarize(), "Running: 1 kernel objects");
    }

    #[test]
    fn test_exit_callback_must_be_callback() {
        let mut kernel = Kernel::default();
        kernel.init();
        let sema = kernel
            .pool_mut()
            .insert(Semaphore::boxed("s", SemaphoreState::default()));
        assert!(kernel.register_exit_callback(sema).is_err());
        assert_eq!(kernel.state().exit_callback(), None);

        let cb = kernel
            .pool_mut()
            .insert(Callback::boxed("exit", CallbackState::default()));
        kernel.register_exit_callback(cb).unwrap();
        assert_eq!(kernel.state().exit_callback(), Some(cb));
    }

    #[test]
    fn test_devkit_version() {
        let kernel = Kernel::default();
        assert_eq!(kernel.devkit_version(), 0x0606_0010);
    }
}
