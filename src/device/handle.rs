//! Open handles on character-special random devices.

use super::{EntropyDevice, Readiness};
use crate::gather::{GatherError, QualityLevel};
use rustix::event::{poll, PollFd, PollFlags};
use std::fs::File;
use std::io::{self, Read};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Quality tier selecting which device a gather reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceTier {
    /// Blocking device, only returns bytes backed by collected entropy.
    Strong,
    /// Non-blocking device.
    Fast,
}

impl DeviceTier {
    /// Both tiers, strong first.
    pub const ALL: [DeviceTier; 2] = [DeviceTier::Strong, DeviceTier::Fast];

    /// Selects the tier for a quality level.
    pub fn for_level(level: QualityLevel) -> Self {
        if level.requires_blocking() {
            DeviceTier::Strong
        } else {
            DeviceTier::Fast
        }
    }

    /// Returns the historical device-class identifier (the Linux minor
    /// number of `/dev/random` and `/dev/urandom`).
    pub fn minor(self) -> u32 {
        match self {
            DeviceTier::Strong => 8,
            DeviceTier::Fast => 9,
        }
    }

    /// Slot index used by the reader.
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            DeviceTier::Strong => 0,
            DeviceTier::Fast => 1,
        }
    }
}

impl std::fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceTier::Strong => f.write_str("strong"),
            DeviceTier::Fast => f.write_str("fast"),
        }
    }
}

/// An open, validated entropy device.
pub struct DeviceHandle {
    file: File,
    path: PathBuf,
    tier: DeviceTier,
}

impl DeviceHandle {
    /// Opens `path` read-only and checks it is a character-special device.
    pub fn open(path: impl AsRef<Path>, tier: DeviceTier) -> Result<Self, GatherError> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|source| GatherError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let metadata = file.metadata().map_err(|source| GatherError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        check_device_type(path, &metadata)?;

        tracing::debug!(
            path = %path.display(),
            %tier,
            minor = tier.minor(),
            "Opened entropy device"
        );

        Ok(Self {
            file,
            path: path.to_path_buf(),
            tier,
        })
    }

    /// Returns the tier this handle serves.
    #[inline]
    pub fn tier(&self) -> DeviceTier {
        self.tier
    }

    /// Returns the underlying descriptor.
    #[inline]
    pub fn raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

#[cfg(not(all(target_arch = "sparc64", target_os = "linux")))]
fn check_device_type(path: &Path, metadata: &std::fs::Metadata) -> Result<(), GatherError> {
    use std::os::unix::fs::FileTypeExt;

    if metadata.file_type().is_char_device() {
        Ok(())
    } else {
        Err(GatherError::NotCharDevice {
            path: path.to_path_buf(),
        })
    }
}

/// Linux on sparc64 reports the random devices with an unexpected file
/// type, so the check is skipped there and nowhere else.
#[cfg(all(target_arch = "sparc64", target_os = "linux"))]
fn check_device_type(path: &Path, _metadata: &std::fs::Metadata) -> Result<(), GatherError> {
    tracing::warn!(path = %path.display(), "Skipping character device check on sparc64 Linux");
    Ok(())
}

impl EntropyDevice for DeviceHandle {
    fn wait_readable(&mut self, timeout: Duration) -> io::Result<Readiness> {
        poll_readable(&self.file, timeout)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("path", &self.path)
            .field("tier", &self.tier)
            .field("fd", &self.raw_fd())
            .finish()
    }
}

fn poll_readable(file: &File, timeout: Duration) -> io::Result<Readiness> {
    let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    let mut fds = [PollFd::new(file, PollFlags::IN)];

    match poll(&mut fds, millis).map_err(io::Error::from)? {
        0 => Ok(Readiness::TimedOut),
        _ => Ok(Readiness::Ready),
    }
}
