//! Scripted entropy devices for testing.
//!
//! A `MockDevice` replays a fixed sequence of events: data chunks,
//! readiness timeouts, interrupted syscalls and hard errors. It never
//! produces real entropy and exists only to drive the gather loop through
//! situations a live `/dev/random` rarely shows on demand.

use super::{DeviceConfig, DeviceOpener, DeviceTier, EntropyDevice, Readiness};
use crate::gather::GatherError;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A single scripted device interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// The device becomes readable and delivers these bytes. Bytes that do
    /// not fit the caller's buffer stay queued for the next read.
    Data(Vec<u8>),
    /// The readiness wait times out.
    Timeout,
    /// The readiness wait fails with this error kind.
    WaitError(io::ErrorKind),
    /// The read is interrupted by a signal.
    Interrupted,
    /// The read fails with this error kind.
    ReadError(io::ErrorKind),
    /// The read fills what fits from these bytes but reports `reported`.
    Bogus { data: Vec<u8>, reported: usize },
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockEvent>,
    waits: usize,
    successful_reads: usize,
    delivered: Vec<u8>,
}

/// Scripted device. Clones share the same script and counters.
#[derive(Debug, Clone)]
pub struct MockDevice {
    path: PathBuf,
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    /// Creates a device that replays `events` in order.
    pub fn new(path: impl Into<PathBuf>, events: impl IntoIterator<Item = MockEvent>) -> Self {
        Self {
            path: path.into(),
            state: Arc::new(Mutex::new(MockState {
                script: events.into_iter().collect(),
                ..Default::default()
            })),
        }
    }

    /// Appends events to the end of the script.
    pub fn push(&self, events: impl IntoIterator<Item = MockEvent>) {
        self.state().script.extend(events);
    }

    /// Number of readiness waits performed.
    pub fn waits(&self) -> usize {
        self.state().waits
    }

    /// Number of reads that returned data without error.
    pub fn successful_reads(&self) -> usize {
        self.state().successful_reads
    }

    /// Every byte written into caller buffers, in order.
    pub fn delivered(&self) -> Vec<u8> {
        self.state().delivered.clone()
    }

    /// Number of events not yet consumed.
    pub fn remaining_events(&self) -> usize {
        self.state().script.len()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EntropyDevice for MockDevice {
    fn wait_readable(&mut self, _timeout: Duration) -> io::Result<Readiness> {
        let mut state = self.state();
        state.waits += 1;

        match state.script.front() {
            Some(MockEvent::Timeout) => {
                state.script.pop_front();
                Ok(Readiness::TimedOut)
            }
            Some(MockEvent::WaitError(kind)) => {
                let kind = *kind;
                state.script.pop_front();
                Err(io::Error::from(kind))
            }
            _ => Ok(Readiness::Ready),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();

        match state.script.pop_front() {
            Some(MockEvent::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    state.script.push_front(MockEvent::Data(data.split_off(n)));
                }
                state.successful_reads += 1;
                state.delivered.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            Some(MockEvent::Bogus { data, reported }) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                state.successful_reads += 1;
                state.delivered.extend_from_slice(&buf[..n]);
                Ok(reported)
            }
            Some(MockEvent::Interrupted) => Err(io::Error::from(io::ErrorKind::Interrupted)),
            Some(MockEvent::ReadError(kind)) => Err(io::Error::from(kind)),
            Some(event @ (MockEvent::Timeout | MockEvent::WaitError(_))) => {
                state.script.push_front(event);
                Ok(0)
            }
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "mock device script exhausted",
            )),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// How a mock tier fails to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFailure {
    /// `open` fails with this error kind.
    Open(io::ErrorKind),
    /// `stat` fails with this error kind.
    Stat(io::ErrorKind),
    /// The path is not a character-special device.
    NotCharDevice,
}

enum Slot {
    Device(MockDevice),
    Fail(OpenFailure),
}

/// Opener handing out pre-built mock devices and counting opens per tier.
pub struct MockOpener {
    slots: [Slot; 2],
    opens: [AtomicUsize; 2],
}

impl MockOpener {
    /// Creates an opener serving `strong` and `fast`.
    pub fn new(strong: MockDevice, fast: MockDevice) -> Self {
        Self {
            slots: [Slot::Device(strong), Slot::Device(fast)],
            opens: [AtomicUsize::new(0), AtomicUsize::new(0)],
        }
    }

    /// Makes opening `tier` fail.
    pub fn failing(mut self, tier: DeviceTier, failure: OpenFailure) -> Self {
        self.slots[tier.index()] = Slot::Fail(failure);
        self
    }

    /// Number of times `tier` was opened.
    pub fn opens(&self, tier: DeviceTier) -> usize {
        self.opens[tier.index()].load(Ordering::SeqCst)
    }
}

impl DeviceOpener for MockOpener {
    type Device = MockDevice;

    fn open(&self, tier: DeviceTier, config: &DeviceConfig) -> Result<MockDevice, GatherError> {
        self.opens[tier.index()].fetch_add(1, Ordering::SeqCst);
        let path = config.path(tier).to_path_buf();

        match &self.slots[tier.index()] {
            Slot::Device(device) => Ok(device.clone()),
            Slot::Fail(OpenFailure::Open(kind)) => Err(GatherError::Open {
                path,
                source: io::Error::from(*kind),
            }),
            Slot::Fail(OpenFailure::Stat(kind)) => Err(GatherError::Stat {
                path,
                source: io::Error::from(*kind),
            }),
            Slot::Fail(OpenFailure::NotCharDevice) => Err(GatherError::NotCharDevice { path }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_split_across_reads() {
        let mut device = MockDevice::new("/mock", [MockEvent::Data(vec![1, 2, 3, 4, 5])]);

        let mut buf = [0u8; 3];
        assert_eq!(device.read(&mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(device.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[4, 5]);
        assert_eq!(device.successful_reads(), 2);
        assert_eq!(device.remaining_events(), 0);
    }

    #[test]
    fn test_wait_consumes_timeouts_only() {
        let mut device = MockDevice::new(
            "/mock",
            [MockEvent::Timeout, MockEvent::Data(vec![9])],
        );
        let timeout = Duration::from_secs(3);

        assert_eq!(device.wait_readable(timeout).unwrap(), Readiness::TimedOut);
        assert_eq!(device.wait_readable(timeout).unwrap(), Readiness::Ready);
        assert_eq!(device.wait_readable(timeout).unwrap(), Readiness::Ready);
        assert_eq!(device.remaining_events(), 1);
        assert_eq!(device.waits(), 3);
    }

    #[test]
    fn test_exhausted_script_errors() {
        let mut device = MockDevice::new("/mock", []);
        let err = device.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_opener_counts_and_fails() {
        let opener = MockOpener::new(MockDevice::new("/s", []), MockDevice::new("/f", []))
            .failing(DeviceTier::Strong, OpenFailure::NotCharDevice);
        let config = DeviceConfig::default();

        assert!(opener.open(DeviceTier::Fast, &config).is_ok());
        assert!(matches!(
            opener.open(DeviceTier::Strong, &config),
            Err(GatherError::NotCharDevice { .. })
        ));
        assert_eq!(opener.opens(DeviceTier::Fast), 1);
        assert_eq!(opener.opens(DeviceTier::Strong), 1);
    }
}
