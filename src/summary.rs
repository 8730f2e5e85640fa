//! Run summary: emitted count plus drops per reason
//!
//! This is the only trace rejected input leaves behind.

use crate::types::DropReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Non-blank lines read
    pub records_seen: u64,
    pub emitted: u64,
    /// Only reasons that occurred appear here
    pub dropped: BTreeMap<DropReason, u64>,
}

impl IngestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_emitted(&mut self) {
        self.records_seen += 1;
        self.emitted += 1;
    }

    pub fn record_drop(&mut self, reason: DropReason) {
        self.records_seen += 1;
        *self.dropped.entry(reason).or_insert(0) += 1;
    }

    pub fn dropped_for(&self, reason: DropReason) -> u64 {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counts_add_up() {
        let mut summary = IngestSummary::new();
        summary.record_emitted();
        summary.record_drop(DropReason::InvalidHeartRate);
        summary.record_drop(DropReason::InvalidHeartRate);
        summary.record_drop(DropReason::MalformedInput);

        assert_eq!(summary.records_seen, 4);
        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.total_dropped(), 3);
        assert_eq!(summary.dropped_for(DropReason::InvalidHeartRate), 2);
        assert_eq!(summary.dropped_for(DropReason::FutureTimestamp), 0);
    }

    #[test]
    fn test_serializes_reason_codes() {
        let mut summary = IngestSummary::new();
        summary.record_emitted();
        summary.record_drop(DropReason::InvalidTemperature);

        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(
            json,
            r#"{"records_seen":2,"emitted":1,"dropped":{"invalid_temperature":1}}"#
        );
    }
}
