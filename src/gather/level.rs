//! Requested randomness quality.

use serde::{Deserialize, Serialize};

/// Caller-selected quality level.
///
/// Only one distinction matters to the reader: levels of 2 and above are
/// served from the blocking device, everything else from the fast one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QualityLevel(i32);

impl QualityLevel {
    /// Nonces and other public randomness.
    pub const WEAK: Self = Self(0);
    /// Session keys.
    pub const STRONG: Self = Self(1);
    /// Long-term key material.
    pub const VERY_STRONG: Self = Self(2);

    const BLOCKING_THRESHOLD: i32 = 2;

    /// Creates a level from its raw value.
    #[inline]
    pub const fn new(level: i32) -> Self {
        Self(level)
    }

    /// Returns the raw level.
    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Returns true if this level must be served by the blocking device.
    #[inline]
    pub const fn requires_blocking(self) -> bool {
        self.0 >= Self::BLOCKING_THRESHOLD
    }
}

impl From<i32> for QualityLevel {
    fn from(level: i32) -> Self {
        Self(level)
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_threshold() {
        assert!(!QualityLevel::WEAK.requires_blocking());
        assert!(!QualityLevel::STRONG.requires_blocking());
        assert!(QualityLevel::VERY_STRONG.requires_blocking());
        assert!(QualityLevel::from(100).requires_blocking());
        assert!(!QualityLevel::from(-1).requires_blocking());
    }
}
