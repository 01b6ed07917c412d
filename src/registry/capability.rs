//! Capability classes and entries.

use crate::gather::{GatherError, GatherReport, QualityLevel};
use thiserror::Error;

/// Signature of a random-gathering callable.
pub type GatherFn = fn(&mut [u8], QualityLevel) -> Result<GatherReport, GatherError>;

/// Kind of function an extension offers, with the host's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityClass {
    /// Message digest algorithm info function.
    DigestInfo,
    /// Integer with available digest algorithms.
    DigestList,
    /// Cipher algorithm info function.
    CipherInfo,
    /// Integer with available cipher algorithms.
    CipherList,
    /// Public key algorithm info function.
    PubkeyInfo,
    /// Integer with available public key algorithms.
    PubkeyList,
    /// Random gathering function.
    GatherRandom,
    /// Fast random poll function.
    FastRandomPoll,
}

impl CapabilityClass {
    /// Returns the host's numeric code.
    pub fn code(self) -> u32 {
        match self {
            CapabilityClass::DigestInfo => 10,
            CapabilityClass::DigestList => 11,
            CapabilityClass::CipherInfo => 20,
            CapabilityClass::CipherList => 21,
            CapabilityClass::PubkeyInfo => 30,
            CapabilityClass::PubkeyList => 31,
            CapabilityClass::GatherRandom => 40,
            CapabilityClass::FastRandomPoll => 41,
        }
    }
}

/// A numeric code that names no known capability class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown capability class {0}")]
pub struct UnknownClass(pub u32);

impl TryFrom<u32> for CapabilityClass {
    type Error = UnknownClass;

    fn try_from(code: u32) -> Result<Self, UnknownClass> {
        Ok(match code {
            10 => CapabilityClass::DigestInfo,
            11 => CapabilityClass::DigestList,
            20 => CapabilityClass::CipherInfo,
            21 => CapabilityClass::CipherList,
            30 => CapabilityClass::PubkeyInfo,
            31 => CapabilityClass::PubkeyList,
            40 => CapabilityClass::GatherRandom,
            41 => CapabilityClass::FastRandomPoll,
            other => return Err(UnknownClass(other)),
        })
    }
}

/// One enumerable entry of an extension.
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    /// What the callable does.
    pub class: CapabilityClass,
    /// Interface version of the callable.
    pub version: u32,
    /// The callable itself.
    pub gather: GatherFn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in [10, 11, 20, 21, 30, 31, 40, 41] {
            let class = CapabilityClass::try_from(code).unwrap();
            assert_eq!(class.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(CapabilityClass::try_from(42), Err(UnknownClass(42)));
        assert_eq!(CapabilityClass::try_from(0), Err(UnknownClass(0)));
    }
}
