//! Device health snapshot served by the exporter.

use crate::device::{DeviceOpener, DeviceTier};
use crate::gather::EntropyReader;
use std::fmt;
use std::path::PathBuf;

/// Open state of one tier's device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierHealth {
    pub tier: DeviceTier,
    /// Configured device path for the tier.
    pub path: PathBuf,
    /// True once the device has been opened.
    pub open: bool,
}

/// Point-in-time view of a reader's devices.
///
/// A reader is unhealthy once any gather has failed fatally; a tier that
/// was never used is simply reported as closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHealth {
    /// One entry per tier, strong first.
    pub tiers: Vec<TierHealth>,
    pub fatal_errors: u64,
    /// Message of the most recent fatal error.
    pub last_error: Option<String>,
}

impl DeviceHealth {
    /// Takes a snapshot of `reader`.
    pub fn of<O: DeviceOpener>(reader: &EntropyReader<O>) -> Self {
        let tiers = DeviceTier::ALL
            .iter()
            .map(|&tier| TierHealth {
                tier,
                path: reader.config().path(tier).to_path_buf(),
                open: reader.is_open(tier),
            })
            .collect();

        Self {
            tiers,
            fatal_errors: reader.stats().fatal_errors,
            last_error: reader.last_error(),
        }
    }

    /// Returns true while no gather has failed fatally.
    pub fn is_healthy(&self) -> bool {
        self.last_error.is_none()
    }
}

impl fmt::Display for DeviceHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_healthy() { "ok" } else { "failing" };
        writeln!(f, "status: {}", status)?;
        for tier in &self.tiers {
            let state = if tier.open { "open" } else { "closed" };
            writeln!(f, "{} {}: {}", tier.tier, tier.path.display(), state)?;
        }
        writeln!(f, "fatal_errors: {}", self.fatal_errors)?;
        if let Some(error) = &self.last_error {
            writeln!(f, "last_error: {}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceConfig, MockDevice, MockEvent, MockOpener, OpenFailure};
    use crate::gather::SilentNotifier;
    use std::io;

    #[test]
    fn test_fresh_reader_is_healthy_and_closed() {
        let opener = MockOpener::new(MockDevice::new("/s", []), MockDevice::new("/f", []));
        let reader = EntropyReader::with_opener(DeviceConfig::default(), opener);

        let health = DeviceHealth::of(&reader);

        assert!(health.is_healthy());
        assert_eq!(health.tiers.len(), 2);
        assert!(health.tiers.iter().all(|t| !t.open));
        assert_eq!(
            health.to_string(),
            "status: ok\nstrong /dev/random: closed\nfast /dev/urandom: closed\nfatal_errors: 0\n"
        );
    }

    #[test]
    fn test_open_tier_and_fatal_error_reported() {
        let fast = MockDevice::new("/f", [MockEvent::Data(vec![1; 4])]);
        let opener = MockOpener::new(MockDevice::new("/s", []), fast)
            .failing(DeviceTier::Strong, OpenFailure::Open(io::ErrorKind::PermissionDenied));
        let reader = EntropyReader::with_opener(DeviceConfig::default(), opener)
            .with_notifier(SilentNotifier);

        reader.gather(&mut [0u8; 4], 0).unwrap();
        let err = reader.gather(&mut [0u8; 4], 2).unwrap_err();

        let health = DeviceHealth::of(&reader);
        assert!(!health.is_healthy());
        assert_eq!(health.fatal_errors, 1);
        assert_eq!(health.last_error, Some(err.to_string()));

        let fast = health
            .tiers
            .iter()
            .find(|t| t.tier == DeviceTier::Fast)
            .unwrap();
        assert!(fast.open);

        let body = health.to_string();
        assert!(body.starts_with("status: failing\n"));
        assert!(body.contains("strong /dev/random: closed\n"));
        assert!(body.contains("fast /dev/urandom: open\n"));
        assert!(body.contains("last_error: can't open /dev/random"));
    }
}
