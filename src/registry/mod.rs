//! Capability registry for host applications.
//!
//! A host toolkit discovers what an extension offers by enumerating
//! `(class, version, callable)` entries. This crate's extension offers a
//! single capability: gathering random bytes.

mod capability;
mod extension;

pub use capability::{Capability, CapabilityClass, GatherFn, UnknownClass};
pub use extension::{Extension, RNDLINUX};
