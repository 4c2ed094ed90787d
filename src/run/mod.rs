pub mod report;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::finding::{Finding, FindingKind, Severity};
use crate::record::ContentRecord;

pub use report::RunReport;

/// A rejected record kept for operator review.
#[derive(Debug, Clone, Serialize)]
pub struct QuarantineEntry {
    pub timestamp: DateTime<Utc>,

    /// The record as it arrived, before any sanitization.
    pub record: ContentRecord,

    /// Distinct finding kinds that blocked admission.
    pub reason: String,

    /// `ContentRecord::fingerprint` of the original record.
    pub fingerprint: String,
}

/// Counters for one curation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub total_processed: u64,
    pub total_rejected: u64,
    pub findings_total: u64,
    pub findings_critical: u64,
    pub findings_high: u64,
    pub findings_medium: u64,
    pub findings_low: u64,
    /// Findings per detector family.
    pub findings_by_kind: BTreeMap<FindingKind, u64>,
}

impl RunStats {
    pub fn total_admitted(&self) -> u64 {
        self.total_processed - self.total_rejected
    }
}

/// Mutable state of a single curation run: counters and the quarantine log.
///
/// Create one per run and pass it to every admission call; independent runs
/// never share one.
#[derive(Debug)]
pub struct RunContext {
    started_at: DateTime<Utc>,
    stats: RunStats,
    quarantine: Vec<QuarantineEntry>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            stats: RunStats::default(),
            quarantine: Vec::new(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn quarantine(&self) -> &[QuarantineEntry] {
        &self.quarantine
    }

    /// The most recent `limit` quarantine entries, oldest first.
    pub fn recent_quarantine(&self, limit: usize) -> &[QuarantineEntry] {
        let start = self.quarantine.len().saturating_sub(limit);
        &self.quarantine[start..]
    }

    /// Drop all quarantine entries, returning how many were removed.
    pub fn clear_quarantine(&mut self) -> usize {
        let count = self.quarantine.len();
        self.quarantine.clear();
        count
    }

    pub fn is_quarantined(&self, record: &ContentRecord) -> bool {
        let fingerprint = record.fingerprint();
        self.quarantine.iter().any(|e| e.fingerprint == fingerprint)
    }

    /// Account for one screened record and its findings.
    pub(crate) fn record_processed(&mut self, findings: &[Finding]) {
        self.stats.total_processed += 1;
        self.stats.findings_total += findings.len() as u64;
        for finding in findings {
            match finding.severity {
                Severity::Critical => self.stats.findings_critical += 1,
                Severity::High => self.stats.findings_high += 1,
                Severity::Medium => self.stats.findings_medium += 1,
                Severity::Low => self.stats.findings_low += 1,
            }
            *self.stats.findings_by_kind.entry(finding.kind).or_insert(0) += 1;
        }
    }

    pub(crate) fn quarantine_record(&mut self, record: ContentRecord, reason: String) {
        self.stats.total_rejected += 1;
        let fingerprint = record.fingerprint();
        self.quarantine.push(QuarantineEntry {
            timestamp: Utc::now(),
            record,
            reason,
            fingerprint,
        });
    }

    /// Reset counters and quarantine for a new run.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
