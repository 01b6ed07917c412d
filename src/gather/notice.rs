//! Operator notifications.
//!
//! A gather from a starved blocking device can stall for a long time. The
//! operator is told once per call how many bytes are still missing so they
//! can generate activity; later timeouts in the same call stay silent.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// A notification delivered to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The device had no data ready within the wait timeout.
    Starvation { remaining: usize },
    /// The readiness wait itself failed and will be retried.
    WaitFailed { message: String },
}

/// Destination for operator-facing notices.
pub trait Notifier: Send + Sync {
    /// Delivers a notice about the device at `path`.
    fn notify(&self, path: &Path, notice: Notice);
}

/// Writes notices to the controlling terminal's error stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, path: &Path, notice: Notice) {
        let mut stderr = io::stderr().lock();
        // The notice is advisory; a closed stderr must not stop the gather.
        let _ = match notice {
            Notice::Starvation { remaining } => write!(
                stderr,
                "\nNot enough random bytes available.  Please do some other work to give\n\
                 the OS a chance to collect more entropy! (Need {} more bytes)\n",
                remaining
            ),
            Notice::WaitFailed { message } => {
                writeln!(stderr, "poll() error on {}: {}", path.display(), message)
            }
        };
    }
}

/// Discards all notices.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _path: &Path, _notice: Notice) {}
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notices received so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Counts received starvation notices.
    pub fn starvation_count(&self) -> usize {
        self.notices()
            .iter()
            .filter(|n| matches!(n, Notice::Starvation { .. }))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, _path: &Path, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice);
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, path: &Path, notice: Notice) {
        (**self).notify(path, notice)
    }
}

/// Lets through the first starvation notice of a call.
#[derive(Debug, Default)]
pub(crate) struct NoticeThrottle {
    emitted: bool,
}

impl NoticeThrottle {
    /// Returns true exactly once.
    pub(crate) fn allow(&mut self) -> bool {
        !std::mem::replace(&mut self.emitted, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_allows_once() {
        let mut throttle = NoticeThrottle::default();
        assert!(throttle.allow());
        assert!(!throttle.allow());
        assert!(!throttle.allow());
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Path::new("/dev/random"), Notice::Starvation { remaining: 12 });
        notifier.notify(
            Path::new("/dev/random"),
            Notice::WaitFailed {
                message: "bad file descriptor".into(),
            },
        );

        assert_eq!(notifier.starvation_count(), 1);
        assert_eq!(notifier.notices()[0], Notice::Starvation { remaining: 12 });
    }
}
