//! Recent distributions kept for display.
//!
//! Local only and never reconciled with chain. Stats always come from a fresh
//! read, this list just remembers what this session submitted.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use uuid::Uuid;

use crate::TransactionId;

/// Outcome of a submission as seen by this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentDistributionRecord {
    pub id: Uuid,
    /// Confirmed signature, `None` when the submission failed
    pub tx_id: Option<String>,
    pub recipient_count: usize,
    /// Whole SOL
    pub total_amount: f64,
    /// Unix seconds
    pub timestamp: u64,
    pub status: DistributionStatus,
}

/// Bounded most-recent-first list of this session's distributions
#[derive(Debug, Clone)]
pub struct RecentDistributions {
    records: VecDeque<RecentDistributionRecord>,
    capacity: usize,
}

impl RecentDistributions {
    pub const DEFAULT_CAPACITY: usize = 5;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a confirmed distribution
    pub fn record_success(
        &mut self,
        tx_id: &TransactionId,
        recipient_count: usize,
        total_amount: f64,
    ) -> &RecentDistributionRecord {
        self.push(Some(tx_id.to_string()), recipient_count, total_amount, DistributionStatus::Completed)
    }

    /// Record a distribution that returned an error
    pub fn record_failure(
        &mut self,
        recipient_count: usize,
        total_amount: f64,
    ) -> &RecentDistributionRecord {
        self.push(None, recipient_count, total_amount, DistributionStatus::Failed)
    }

    fn push(
        &mut self,
        tx_id: Option<String>,
        recipient_count: usize,
        total_amount: f64,
        status: DistributionStatus,
    ) -> &RecentDistributionRecord {
        self.records.push_front(RecentDistributionRecord {
            id: Uuid::new_v4(),
            tx_id,
            recipient_count,
            total_amount,
            timestamp: now(),
            status,
        });
        self.records.truncate(self.capacity.max(1));
        &self.records[0]
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &RecentDistributionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for RecentDistributions {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signature::Signature;

    #[test]
    fn test_newest_first() {
        let mut history = RecentDistributions::new();
        history.record_success(&Signature::default(), 1, 1.0);
        history.record_success(&Signature::default(), 2, 2.0);

        let counts: Vec<usize> = history.iter().map(|r| r.recipient_count).collect();
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn test_bounded_to_five() {
        let mut history = RecentDistributions::new();
        for i in 0..8 {
            history.record_success(&Signature::default(), i, i as f64);
        }

        assert_eq!(history.len(), 5);
        assert_eq!(history.iter().next().unwrap().recipient_count, 7);
        assert_eq!(history.iter().last().unwrap().recipient_count, 3);
    }

    #[test]
    fn test_failure_has_no_tx_id() {
        let mut history = RecentDistributions::new();
        let record = history.record_failure(3, 4.5).clone();
        assert_eq!(record.status, DistributionStatus::Failed);
        assert!(record.tx_id.is_none());
    }

    #[test]
    fn test_ids_unique() {
        let mut history = RecentDistributions::new();
        let a = history.record_success(&Signature::default(), 1, 1.0).id;
        let b = history.record_success(&Signature::default(), 1, 1.0).id;
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_serializes_for_display() {
        let mut history = RecentDistributions::new();
        let record = history.record_success(&Signature::default(), 2, 3.5).clone();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["recipientCount"], 2);
        assert_eq!(json["txId"], Signature::default().to_string());
    }
}
