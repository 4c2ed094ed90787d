use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::pipeline::{CurationBatch, Shortfall};
use crate::record::SourceType;

use super::{RunContext, RunStats};

/// One quarantined record, trimmed for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct QuarantineSummary {
    pub timestamp: DateTime<Utc>,
    pub source_type: SourceType,
    pub title: String,
    pub reason: String,
    pub fingerprint: String,
}

/// Snapshot of a run for operational reporting.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub stats: RunStats,
    pub quarantined: Vec<QuarantineSummary>,
    pub shortfalls: Vec<Shortfall>,
}

impl RunReport {
    pub fn new(ctx: &RunContext, batch: Option<&CurationBatch>) -> Self {
        let quarantined = ctx
            .quarantine()
            .iter()
            .map(|e| QuarantineSummary {
                timestamp: e.timestamp,
                source_type: e.record.source_type,
                title: e.record.display_title().to_string(),
                reason: e.reason.clone(),
                fingerprint: e.fingerprint.clone(),
            })
            .collect();

        Self {
            started_at: ctx.started_at(),
            generated_at: Utc::now(),
            stats: ctx.stats().clone(),
            quarantined,
            shortfalls: batch.map(|b| b.shortfalls()).unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text summary listing at most `recent` quarantined items.
    pub fn render_text(&self, recent: usize) -> String {
        let mut out = Vec::new();
        out.push("digest-gate run report".to_string());
        out.push("======================".to_string());
        out.push(format!(
            "Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push(String::new());
        out.push(format!("Records processed: {}", self.stats.total_processed));
        out.push(format!("Records rejected:  {}", self.stats.total_rejected));
        out.push(format!(
            "Findings: {} (critical {}, high {}, medium {}, low {})",
            self.stats.findings_total,
            self.stats.findings_critical,
            self.stats.findings_high,
            self.stats.findings_medium,
            self.stats.findings_low
        ));
        if !self.stats.findings_by_kind.is_empty() {
            let by_kind: Vec<String> = self
                .stats
                .findings_by_kind
                .iter()
                .map(|(kind, count)| format!("{kind} {count}"))
                .collect();
            out.push(format!("By kind: {}", by_kind.join(", ")));
        }

        if !self.shortfalls.is_empty() {
            out.push(String::new());
            out.push("Shortfalls:".to_string());
            for s in &self.shortfalls {
                out.push(format!("  {}: {}/{}", s.source_type, s.delivered, s.target));
            }
        }

        if !self.quarantined.is_empty() {
            out.push(String::new());
            out.push("Quarantined:".to_string());
            let start = self.quarantined.len().saturating_sub(recent);
            for q in &self.quarantined[start..] {
                let title: String = q.title.chars().take(50).collect();
                out.push(format!(
                    "  {} [{}] {} ({})",
                    q.timestamp.format("%H:%M:%S"),
                    q.source_type,
                    title,
                    q.reason
                ));
            }
        }

        out.join("\n")
    }
}
