//! Per-call reports and cumulative statistics.

/// Quality percentage reported for every successful gather.
///
/// Bytes that came from the selected device at all are taken as fully
/// trustworthy at the requested level; no score is computed.
pub const QUALITY_PERCENT: u8 = 100;

/// Outcome of a successful gather.
///
/// A report only exists for a fully satisfied request: `bytes` always
/// equals the requested length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatherReport {
    /// Bytes written into the caller's buffer.
    pub bytes: usize,
    /// Reads that returned data.
    pub reads: u64,
    /// Reads that returned no bytes although the device was readable.
    pub zero_reads: u64,
    /// Readiness waits that timed out.
    pub timeouts: u64,
    /// Readiness waits that failed and were retried.
    pub wait_errors: u64,
    /// Reads interrupted by a signal and retried.
    pub interrupted_reads: u64,
    /// Reads that reported more bytes than requested and were clamped.
    pub bogus_reads: u64,
    /// Starvation notices delivered to the operator.
    pub notices: u64,
}

impl GatherReport {
    /// Returns the quality percentage, always [`QUALITY_PERCENT`].
    #[inline]
    pub fn quality(&self) -> u8 {
        QUALITY_PERCENT
    }
}

/// Cumulative counters across all gathers of a reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatherStats {
    /// Successful gather calls, including zero-length ones.
    pub requests: u64,
    /// Total bytes delivered.
    pub bytes: u64,
    pub reads: u64,
    pub zero_reads: u64,
    pub timeouts: u64,
    pub wait_errors: u64,
    pub interrupted_reads: u64,
    pub bogus_reads: u64,
    pub notices: u64,
    /// Devices opened (at most one per tier).
    pub device_opens: u64,
    /// Gathers that ended in a fatal error.
    pub fatal_errors: u64,
}

impl GatherStats {
    /// Folds a successful gather into the totals.
    pub fn record(&mut self, report: &GatherReport) {
        self.requests += 1;
        self.bytes += report.bytes as u64;
        self.reads += report.reads;
        self.zero_reads += report.zero_reads;
        self.timeouts += report.timeouts;
        self.wait_errors += report.wait_errors;
        self.interrupted_reads += report.interrupted_reads;
        self.bogus_reads += report.bogus_reads;
        self.notices += report.notices;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_is_constant() {
        assert_eq!(GatherReport::default().quality(), 100);
        let report = GatherReport {
            bytes: 32,
            timeouts: 40,
            ..Default::default()
        };
        assert_eq!(report.quality(), QUALITY_PERCENT);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut stats = GatherStats::default();
        let report = GatherReport {
            bytes: 16,
            reads: 2,
            timeouts: 3,
            notices: 1,
            ..Default::default()
        };

        stats.record(&report);
        stats.record(&report);

        assert_eq!(stats.requests, 2);
        assert_eq!(stats.bytes, 32);
        assert_eq!(stats.reads, 4);
        assert_eq!(stats.timeouts, 6);
        assert_eq!(stats.notices, 2);
    }
}
