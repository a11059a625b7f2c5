//! Kernel configuration

use serde::{Deserialize, Serialize};

/// Settings the kernel reads at init time
///
/// Missing fields take their default, so an empty config file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Emulated firmware version as three decimal digits, e.g. `660` for 6.6.0
    pub firmware_version: u32,

    /// Developer switch bits reported by the GPI register
    pub gpi_switches: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            firmware_version: 660,
            gpi_switches: 0,
        }
    }
}

impl KernelConfig {
    /// Firmware version split into `(major, minor, revision)`
    pub fn firmware_triplet(&self) -> (u32, u32, u32) {
        let version = self.firmware_version;
        (version / 100, (version / 10) % 10, version % 10)
    }

    /// Value returned by the guest's devkit-version query
    pub fn devkit_version(&self) -> u32 {
        let (major, minor, revision) = self.firmware_triplet();
        (major << 24) | (minor << 16) | (revision << 8) | 0x10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_firmware() {
        let config = KernelConfig::default();
        assert_eq!(config.firmware_triplet(), (6, 6, 0));
        assert_eq!(config.devkit_version(), 0x0606_0010);
    }

    #[test]
    fn test_devkit_version_with_revision() {
        let config = KernelConfig {
            firmware_version: 371,
            ..Default::default()
        };
        assert_eq!(config.devkit_version(), 0x0307_0110);
    }
}
