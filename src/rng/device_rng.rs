//! Device-backed random number generator.

use crate::device::{DeviceOpener, SystemOpener};
use crate::gather::{EntropyReader, QualityLevel};
use rand_core::{CryptoRng, RngCore};

/// An `RngCore` that reads every byte from an entropy device.
///
/// Each request is one gather at the configured quality level, so a strong
/// level can block while the blocking device is starved.
pub struct DeviceRng<'a, O: DeviceOpener = SystemOpener> {
    reader: &'a EntropyReader<O>,
    level: QualityLevel,
    bytes_generated: u64,
}

impl DeviceRng<'static, SystemOpener> {
    /// Creates a generator over the process-wide reader.
    pub fn new(level: impl Into<QualityLevel>) -> Self {
        Self::with_reader(EntropyReader::global(), level)
    }
}

impl<'a, O: DeviceOpener> DeviceRng<'a, O> {
    /// Creates a generator over `reader`.
    pub fn with_reader(reader: &'a EntropyReader<O>, level: impl Into<QualityLevel>) -> Self {
        Self {
            reader,
            level: level.into(),
            bytes_generated: 0,
        }
    }

    /// Returns the quality level requested from the reader.
    pub fn level(&self) -> QualityLevel {
        self.level
    }

    /// Returns the total bytes delivered so far.
    pub fn bytes_generated(&self) -> u64 {
        self.bytes_generated
    }
}

impl<O: DeviceOpener> RngCore for DeviceRng<'_, O> {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    /// # Panics
    ///
    /// Panics if the device fails; use `try_fill_bytes` to handle the error.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        if let Err(err) = self.try_fill_bytes(dest) {
            panic!("entropy device failure: {}", err);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        let report = self
            .reader
            .gather(dest, self.level)
            .map_err(rand_core::Error::new)?;
        self.bytes_generated += report.bytes as u64;
        Ok(())
    }
}

impl<O: DeviceOpener> CryptoRng for DeviceRng<'_, O> {}
