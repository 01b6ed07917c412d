//! Blocking entropy gathering.
//!
//! `EntropyReader` turns a request for N bytes at a quality level into
//! exactly N bytes read from the matching device. Starvation and
//! interrupted syscalls are absorbed by retrying; anything that makes the
//! device untrustworthy surfaces as a fatal `GatherError`.

mod error;
mod level;
mod notice;
mod reader;
mod report;

pub use error::GatherError;
pub use level::QualityLevel;
pub use notice::{Notice, Notifier, RecordingNotifier, SilentNotifier, TerminalNotifier};
pub use reader::{fill_from_device, EntropyReader};
pub use report::{GatherReport, GatherStats, QUALITY_PERCENT};
