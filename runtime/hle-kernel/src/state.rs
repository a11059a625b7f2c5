//! Process-wide kernel state

use hle_kobj::Handle;

/// Running flag and debug registers owned by the kernel
///
/// The GPO and GPI registers are eight bits wide on hardware; the full word
/// is kept so guests that write wider values read them back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KernelState {
    running: bool,
    gpo: u32,
    gpi: u32,
    exit_callback: Handle,
}

impl KernelState {
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Debug LED bits last written by the guest
    pub fn gpo(&self) -> u32 {
        self.gpo
    }

    /// Developer switch bits
    pub fn gpi(&self) -> u32 {
        self.gpi
    }

    pub fn set_gpo(&mut self, bits: u32) {
        self.gpo = bits;
    }

    /// Registered exit callback, if any
    pub fn exit_callback(&self) -> Option<Handle> {
        (!self.exit_callback.is_none()).then_some(self.exit_callback)
    }

    pub fn set_exit_callback(&mut self, handle: Handle) {
        self.exit_callback = handle;
    }

    /// Reset the registers for a fresh boot; the running flag is untouched
    pub(crate) fn prepare(&mut self, gpi_switches: u32) {
        self.gpo = 0;
        self.gpi = gpi_switches;
        self.exit_callback = Handle::NONE;
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Raw fields for snapshots
    pub(crate) fn running_mut(&mut self) -> &mut bool {
        &mut self.running
    }

    pub(crate) fn exit_callback_mut(&mut self) -> &mut Handle {
        &mut self.exit_callback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_keeps_running_flag() {
        let mut state = KernelState::default();
        state.set_running(true);
        state.set_gpo(0xFF);
        state.prepare(0x3);
        assert!(state.is_running());
        assert_eq!(state.gpo(), 0);
        assert_eq!(state.gpi(), 0x3);
    }

    #[test]
    fn test_exit_callback_none_by_default() {
        let mut state = KernelState::default();
        assert_eq!(state.exit_callback(), None);
        state.set_exit_callback(Handle::from_raw(0x110));
        assert_eq!(state.exit_callback(), Some(Handle::from_raw(0x110)));
        state.reset();
        assert_eq!(state.exit_callback(), None);
    }
}
