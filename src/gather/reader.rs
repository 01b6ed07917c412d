//! The entropy reader and its read loop.

use super::notice::NoticeThrottle;
use super::{GatherError, GatherReport, GatherStats, Notice, Notifier, QualityLevel, TerminalNotifier};
use crate::device::{DeviceConfig, DeviceOpener, DeviceTier, EntropyDevice, Readiness, SystemOpener};
use std::io;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

static GLOBAL: OnceLock<EntropyReader> = OnceLock::new();

/// Reads exact byte counts from the strong and fast entropy devices.
///
/// Each tier's device is opened on first use and kept open for the life of
/// the reader. A per-tier lock is held for the whole of a gather, so at
/// most one gather reads from a given device at a time and the lazy open
/// happens exactly once even under contention. The two tiers do not block
/// each other.
pub struct EntropyReader<O: DeviceOpener = SystemOpener> {
    config: DeviceConfig,
    opener: O,
    notifier: Box<dyn Notifier>,
    tiers: [Mutex<Option<O::Device>>; 2],
    stats: Mutex<GatherStats>,
    last_error: Mutex<Option<String>>,
}

impl EntropyReader<SystemOpener> {
    /// Creates a reader over the system devices named in `config`.
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_opener(config, SystemOpener)
    }

    /// Returns the process-wide reader.
    ///
    /// Uses the default device configuration unless [`EntropyReader::install`]
    /// ran first.
    pub fn global() -> &'static EntropyReader {
        GLOBAL.get_or_init(|| EntropyReader::new(DeviceConfig::default()))
    }

    /// Installs `reader` as the process-wide reader.
    ///
    /// Fails, handing the reader back, if the global reader already exists.
    pub fn install(reader: EntropyReader) -> Result<&'static EntropyReader, EntropyReader> {
        GLOBAL.set(reader)?;
        Ok(Self::global())
    }
}

impl<O: DeviceOpener> EntropyReader<O> {
    /// Creates a reader that opens its devices through `opener`.
    pub fn with_opener(config: DeviceConfig, opener: O) -> Self {
        Self {
            config,
            opener,
            notifier: Box::new(TerminalNotifier),
            tiers: [Mutex::new(None), Mutex::new(None)],
            stats: Mutex::new(GatherStats::default()),
            last_error: Mutex::new(None),
        }
    }

    /// Replaces the operator notifier.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Returns the device configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the opener.
    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Fills `buffer` completely with bytes from the device for `level`.
    ///
    /// Blocks for as long as the device is starved, notifying the operator
    /// once per call. An empty buffer returns immediately without touching
    /// any device. On error the buffer is zeroed and no report is returned.
    pub fn gather(
        &self,
        buffer: &mut [u8],
        level: impl Into<QualityLevel>,
    ) -> Result<GatherReport, GatherError> {
        if buffer.is_empty() {
            self.lock_stats().record(&GatherReport::default());
            return Ok(GatherReport::default());
        }

        let level = level.into();
        let tier = DeviceTier::for_level(level);
        tracing::trace!(%level, %tier, length = buffer.len(), "Gathering random bytes");

        let mut slot = self.tiers[tier.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let result = self.gather_locked(&mut slot, tier, buffer);
        drop(slot);

        match &result {
            Ok(report) => self.lock_stats().record(report),
            Err(err) => {
                self.lock_stats().fatal_errors += 1;
                *self
                    .last_error
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(err.to_string());
            }
        }
        result
    }

    /// Fills the first `length` bytes of `buffer`.
    ///
    /// # Panics
    ///
    /// Panics if `length` exceeds `buffer.len()`.
    pub fn gather_len(
        &self,
        buffer: &mut [u8],
        length: usize,
        level: impl Into<QualityLevel>,
    ) -> Result<GatherReport, GatherError> {
        self.gather(&mut buffer[..length], level)
    }

    /// Returns true once the device for `tier` has been opened.
    pub fn is_open(&self, tier: DeviceTier) -> bool {
        self.tiers[tier.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns cumulative statistics.
    pub fn stats(&self) -> GatherStats {
        *self.lock_stats()
    }

    /// Returns the message of the most recent fatal error, if any gather
    /// has failed.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn gather_locked(
        &self,
        slot: &mut Option<O::Device>,
        tier: DeviceTier,
        buffer: &mut [u8],
    ) -> Result<GatherReport, GatherError> {
        let device = match slot.take() {
            Some(device) => device,
            None => {
                let device = self.opener.open(tier, &self.config).map_err(|err| {
                    tracing::error!(%tier, error = %err, "Failed to open entropy device");
                    err
                })?;
                self.lock_stats().device_opens += 1;
                device
            }
        };
        let device = slot.insert(device);

        fill_from_device(device, buffer, self.config.wait_timeout(), &*self.notifier)
    }

    fn lock_stats(&self) -> MutexGuard<'_, GatherStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fills `buffer` from `device`, retrying until every byte is delivered.
///
/// Timeouts and failed or interrupted waits are retried indefinitely. An
/// interrupted read is retried; a read claiming more bytes than requested
/// is clamped. Any other read error is fatal, and the buffer is zeroed
/// before the error is returned.
pub fn fill_from_device<D: EntropyDevice + ?Sized>(
    device: &mut D,
    buffer: &mut [u8],
    timeout: Duration,
    notifier: &dyn Notifier,
) -> Result<GatherReport, GatherError> {
    let mut report = GatherReport::default();
    let mut throttle = NoticeThrottle::default();
    let mut filled = 0;

    while filled < buffer.len() {
        let remaining = buffer.len() - filled;

        match device.wait_readable(timeout) {
            Ok(Readiness::Ready) => {}
            Ok(Readiness::TimedOut) => {
                report.timeouts += 1;
                if throttle.allow() {
                    tracing::warn!(
                        path = %device.path().display(),
                        remaining,
                        "Not enough random bytes available"
                    );
                    notifier.notify(device.path(), Notice::Starvation { remaining });
                    report.notices += 1;
                }
                continue;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                report.wait_errors += 1;
                tracing::trace!(path = %device.path().display(), "Readiness wait interrupted");
                continue;
            }
            Err(err) => {
                report.wait_errors += 1;
                tracing::warn!(path = %device.path().display(), error = %err, "Readiness wait failed");
                notifier.notify(
                    device.path(),
                    Notice::WaitFailed {
                        message: err.to_string(),
                    },
                );
                continue;
            }
        }

        let read = loop {
            match device.read(&mut buffer[filled..]) {
                Ok(n) if n > remaining => {
                    report.bogus_reads += 1;
                    tracing::error!(
                        path = %device.path().display(),
                        n,
                        remaining,
                        "Bogus read from random device"
                    );
                    break remaining;
                }
                Ok(0) => {
                    report.zero_reads += 1;
                    tracing::debug!(
                        path = %device.path().display(),
                        remaining,
                        "Device was readable but returned no bytes"
                    );
                    break 0;
                }
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    report.interrupted_reads += 1;
                    tracing::debug!(path = %device.path().display(), "Read interrupted, retrying");
                }
                Err(source) => {
                    tracing::error!(
                        path = %device.path().display(),
                        error = %source,
                        "Read error on random device"
                    );
                    buffer.fill(0);
                    return Err(GatherError::Read {
                        path: device.path().to_path_buf(),
                        source,
                    });
                }
            }
        };

        if read > 0 {
            report.reads += 1;
        }
        filled += read;
    }

    report.bytes = filled;
    Ok(report)
}
