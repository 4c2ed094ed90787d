use std::collections::BTreeSet;

use crate::config::GateConfig;
use crate::error::Result;
use crate::finding::{Finding, Severity};
use crate::links::LinkValidator;
use crate::record::{ContentRecord, TextField};
use crate::run::RunContext;
use crate::scan::ThreatScanner;

/// Loosest threshold admission accepts. Matches `ScanResult::is_safe`.
pub const MAX_BLOCKING_SEVERITY: Severity = Severity::High;

/// Outcome of screening one record.
#[derive(Debug, Clone)]
pub struct Admission {
    pub admitted: bool,
    /// The record with every present field replaced by its sanitized text.
    pub record: ContentRecord,
    pub findings: Vec<Finding>,
}

/// Screens whole records and decides admission.
pub struct AdmissionController {
    scanner: ThreatScanner,
    links: LinkValidator,
    blocking_severity: Severity,
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(ThreatScanner::default(), LinkValidator::default(), Severity::High)
    }
}

impl AdmissionController {
    /// Thresholds above high are capped at high, so an admitted record never
    /// carries a field whose scan is unsafe.
    pub fn new(scanner: ThreatScanner, links: LinkValidator, blocking_severity: Severity) -> Self {
        if blocking_severity > MAX_BLOCKING_SEVERITY {
            tracing::warn!(
                "blocking severity {} is above {}, using {}",
                blocking_severity,
                MAX_BLOCKING_SEVERITY,
                MAX_BLOCKING_SEVERITY
            );
        }
        Self {
            scanner,
            links,
            blocking_severity: blocking_severity.min(MAX_BLOCKING_SEVERITY),
        }
    }

    /// Build the scanner and link validator from config.
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        let placeholders = &config.admission.placeholders;
        let scanner = ThreatScanner::with_options(placeholders, &config.scanner.extra_keywords)?;
        let links = LinkValidator::new(config.links.clone(), placeholders.clone());
        Ok(Self::new(scanner, links, config.admission.blocking_severity))
    }

    pub fn blocking_severity(&self) -> Severity {
        self.blocking_severity
    }

    pub fn links(&self) -> &LinkValidator {
        &self.links
    }

    /// Scan every present field, sanitize it in place and decide admission.
    ///
    /// Rejected records are quarantined on `ctx` in their original form.
    pub fn admit(&self, record: &ContentRecord, ctx: &mut RunContext) -> Admission {
        let mut screened = record.clone().validate();
        let mut findings = Vec::new();

        for field in TextField::ALL {
            let Some(text) = screened.field(field) else {
                continue;
            };
            let label = field.label();
            let (sanitized, scan_findings) = self.scanner.scan(text, label).into_parts();
            findings.extend(scan_findings);
            if field == TextField::Link {
                findings.extend(self.links.validate_urls(text, label));
            }
            screened.set_field(field, sanitized);
        }

        ctx.record_processed(&findings);

        let blocking: BTreeSet<String> = findings
            .iter()
            .filter(|f| f.severity >= self.blocking_severity)
            .map(|f| f.kind.to_string())
            .collect();
        let admitted = blocking.is_empty();

        if !admitted {
            let reason = format!(
                "blocked by: {}",
                blocking.into_iter().collect::<Vec<_>>().join(", ")
            );
            tracing::warn!(
                "rejected {} '{}': {}",
                record.source_type,
                record.display_title(),
                reason
            );
            ctx.quarantine_record(record.clone(), reason);
        }

        Admission {
            admitted,
            record: screened,
            findings,
        }
    }
}
