//! Operating-system entropy devices.
//!
//! This module provides the character-special devices the gatherer reads
//! from, the trait the read loop is written against, and a scripted mock
//! device for exercising the loop without real entropy starvation.

mod config;
mod handle;
mod mock;
mod source;

pub use config::{ConfigError, DeviceConfig, FileConfig, OutputConfig};
pub use handle::{DeviceHandle, DeviceTier};
pub use mock::{MockDevice, MockEvent, MockOpener, OpenFailure};
pub use source::{DeviceOpener, EntropyDevice, Readiness, SystemOpener};
