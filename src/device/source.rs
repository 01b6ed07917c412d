//! Device abstraction for the gather loop.
//!
//! The read loop only needs two primitives from a device: a bounded wait
//! for readability and a plain read. Keeping them behind a trait lets the
//! loop run against scripted devices in tests.

use super::{DeviceConfig, DeviceHandle, DeviceTier};
use crate::gather::GatherError;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Outcome of a readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The device has data to read.
    Ready,
    /// The timeout elapsed with no data ready.
    TimedOut,
}

/// Trait for entropy device implementations.
pub trait EntropyDevice {
    /// Waits until the device is readable or the timeout elapses.
    ///
    /// An error here is never fatal; the caller retries the wait.
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<Readiness>;

    /// Reads up to `buf.len()` bytes, returning the count the device reported.
    ///
    /// The reported count is not trusted: a misbehaving device may claim
    /// more than `buf.len()` bytes and the caller clamps it.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Returns the path the device was opened from.
    fn path(&self) -> &Path;
}

/// Opens the device backing a tier.
///
/// The reader calls this at most once per tier.
pub trait DeviceOpener {
    /// Device type produced by this opener.
    type Device: EntropyDevice;

    /// Opens and validates the device for `tier`.
    fn open(&self, tier: DeviceTier, config: &DeviceConfig) -> Result<Self::Device, GatherError>;
}

/// Opens the real character-special devices named in the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl DeviceOpener for SystemOpener {
    type Device = DeviceHandle;

    fn open(&self, tier: DeviceTier, config: &DeviceConfig) -> Result<DeviceHandle, GatherError> {
        DeviceHandle::open(config.path(tier), tier)
    }
}
