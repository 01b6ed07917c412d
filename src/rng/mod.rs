//! `rand_core` interface over the entropy reader.
//!
//! This module lets code written against `RngCore` draw raw device bytes
//! directly. No buffering or post-processing takes place.

mod device_rng;

pub use device_rng::DeviceRng;
