//! Fatal gather conditions.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that make an entropy device unusable.
///
/// Every variant is fatal: the device can no longer be trusted to deliver
/// the requested bytes, and the process embedding the reader is expected
/// to stop rather than continue with weaker randomness. Recoverable
/// conditions (starvation, interrupted syscalls) never reach the caller.
#[derive(Debug, Error)]
pub enum GatherError {
    #[error("can't open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("stat() of {} failed: {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },
    #[error("invalid random device {}: not a character device", path.display())]
    NotCharDevice { path: PathBuf },
    #[error("read error on random device {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

impl GatherError {
    /// Returns true if the error must end the embedding process.
    ///
    /// This holds for every variant; the method exists so host code can
    /// state the policy at the call site.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Returns the device path involved.
    pub fn path(&self) -> &Path {
        match self {
            GatherError::Open { path, .. }
            | GatherError::Stat { path, .. }
            | GatherError::NotCharDevice { path }
            | GatherError::Read { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_device() {
        let err = GatherError::Read {
            path: PathBuf::from("/dev/random"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        let message = err.to_string();
        assert!(message.starts_with("read error on random device /dev/random"));
        assert_eq!(err.path(), Path::new("/dev/random"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_not_char_device_message() {
        let err = GatherError::NotCharDevice {
            path: PathBuf::from("/tmp/random"),
        };
        assert_eq!(
            err.to_string(),
            "invalid random device /tmp/random: not a character device"
        );
    }
}
