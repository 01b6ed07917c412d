//! OS Entropy Library
//!
//! A raw entropy source reading from the operating system's character
//! random devices. It delivers exactly the requested number of bytes at a
//! requested quality level, waiting out entropy starvation instead of
//! returning short results.
//!
//! # Architecture
//!
//! ```text
//! registry (host enumeration) ──┐
//! rng (RngCore adapter) ────────┼──> gather (EntropyReader) ──> device
//!                               │          │
//!                               │       metrics
//! ```
//!
//! # Design Principles
//!
//! - **Never short**: a gather fills the whole buffer or fails
//! - **Fail-closed**: device errors are fatal and surface as `GatherError`;
//!   the embedding process decides to stop
//! - **Raw source**: no mixing, whitening or caching; a higher-level pool
//!   is expected to consume these bytes
//! - **Quality is a constant**: bytes from the selected device are taken
//!   as 100% useful at the requested level
//!
//! # Example
//!
//! ```no_run
//! use os_entropy::{EntropyReader, QualityLevel};
//!
//! let reader = EntropyReader::global();
//!
//! let mut key = [0u8; 32];
//! match reader.gather(&mut key, QualityLevel::VERY_STRONG) {
//!     Ok(report) => assert_eq!(report.quality(), 100),
//!     Err(err) => {
//!         eprintln!("fatal: {}", err);
//!         std::process::exit(2);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

#[cfg(not(unix))]
compile_error!("os-entropy requires a unix platform with character random devices");

pub mod device;
pub mod gather;
pub mod metrics;
pub mod registry;
pub mod rng;

// Re-export commonly used types at crate root
pub use device::{DeviceConfig, DeviceHandle, DeviceTier, FileConfig};
pub use gather::{EntropyReader, GatherError, GatherReport, QualityLevel, QUALITY_PERCENT};
pub use registry::{Capability, CapabilityClass, Extension, RNDLINUX};
pub use rng::DeviceRng;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
