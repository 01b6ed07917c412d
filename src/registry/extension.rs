//! Extension tables and their enumeration.

use super::{Capability, CapabilityClass};
use crate::gather::{EntropyReader, GatherError, GatherReport, QualityLevel};

/// The raw device extension, offering the global reader's `gather`.
pub static RNDLINUX: Extension = Extension {
    name: "RNDLINUX",
    version: env!("CARGO_PKG_VERSION"),
    table: &[Capability {
        class: CapabilityClass::GatherRandom,
        version: 1,
        gather: gather_random,
    }],
};

fn gather_random(buffer: &mut [u8], level: QualityLevel) -> Result<GatherReport, GatherError> {
    EntropyReader::global().gather(buffer, level)
}

/// A named, fixed table of capabilities.
#[derive(Debug)]
pub struct Extension {
    name: &'static str,
    version: &'static str,
    table: &'static [Capability],
}

impl Extension {
    /// Returns the extension name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the extension version string.
    pub fn version(&self) -> &'static str {
        self.version
    }

    /// Returns the next entry at or after `cursor` matching `what`.
    ///
    /// `None` for `what` matches every class. Start with a cursor of 0 and
    /// pass it back unchanged; it is advanced past each returned entry and
    /// left untouched once the table is exhausted.
    pub fn enumerate(
        &self,
        what: Option<CapabilityClass>,
        cursor: &mut usize,
    ) -> Option<&'static Capability> {
        let table = self.table;
        let (offset, entry) = table
            .iter()
            .enumerate()
            .skip(*cursor)
            .find(|(_, entry)| what.map_or(true, |class| class == entry.class))?;

        *cursor = offset + 1;
        Some(entry)
    }

    /// Iterates over entries matching `what`, from the start of the table.
    pub fn capabilities(
        &self,
        what: Option<CapabilityClass>,
    ) -> impl Iterator<Item = &'static Capability> {
        let table = self.table;
        table
            .iter()
            .filter(move |entry| what.map_or(true, |class| class == entry.class))
    }

    /// Returns the first entry of `class`.
    pub fn find(&self, class: CapabilityClass) -> Option<&'static Capability> {
        self.capabilities(Some(class)).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_all() {
        let mut cursor = 0;

        let entry = RNDLINUX.enumerate(None, &mut cursor).unwrap();
        assert_eq!(entry.class, CapabilityClass::GatherRandom);
        assert_eq!(entry.class.code(), 40);
        assert_eq!(entry.version, 1);
        assert_eq!(cursor, 1);

        assert!(RNDLINUX.enumerate(None, &mut cursor).is_none());
        assert_eq!(cursor, 1);
    }

    #[test]
    fn test_enumerate_filtered() {
        let mut cursor = 0;
        assert!(RNDLINUX
            .enumerate(Some(CapabilityClass::FastRandomPoll), &mut cursor)
            .is_none());
        assert_eq!(cursor, 0);

        assert!(RNDLINUX
            .enumerate(Some(CapabilityClass::GatherRandom), &mut cursor)
            .is_some());
    }

    #[test]
    fn test_cursor_past_end() {
        let mut cursor = 17;
        assert!(RNDLINUX.enumerate(None, &mut cursor).is_none());
        assert_eq!(cursor, 17);
    }

    #[test]
    fn test_capabilities_restart() {
        assert_eq!(RNDLINUX.capabilities(None).count(), 1);
        assert_eq!(RNDLINUX.capabilities(None).count(), 1);
        assert!(RNDLINUX.find(CapabilityClass::DigestInfo).is_none());
        assert_eq!(RNDLINUX.name(), "RNDLINUX");
    }

    #[test]
    fn test_version_tracks_crate() {
        assert_eq!(RNDLINUX.version(), crate::VERSION);
        assert!(!RNDLINUX.version().is_empty());
    }

    #[test]
    fn test_registered_gather_reads_fast_device() {
        let entry = RNDLINUX.find(CapabilityClass::GatherRandom).unwrap();
        let mut buf = [0u8; 16];
        let report = (entry.gather)(&mut buf, QualityLevel::WEAK).unwrap();
        assert_eq!(report.bytes, 16);
        assert_eq!(report.quality(), 100);
    }
}
