pub mod policy;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::finding::{Finding, FindingKind, Severity};
use crate::scan::Placeholders;

pub use policy::{normalize_host, LinkPolicy};

/// URL-looking tokens: a scheme, `://`, then everything up to whitespace or a
/// delimiter.
static URL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b[a-z][a-z0-9+.\-]*://[^\s<>"'(){}|\\^`\[\]]+"#)
        .expect("url token pattern should compile")
});

/// How far a feed source is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    High,
    Low,
    /// The URL could not be judged (unparseable or non-web scheme).
    Unknown,
}

/// Verdict on one feed source URL.
#[derive(Debug, Clone, Serialize)]
pub struct SourceValidation {
    pub url: String,
    pub is_safe: bool,
    pub trust_level: TrustLevel,
    pub findings: Vec<Finding>,
    /// Operator follow-ups, such as manual review of an unlisted domain.
    pub recommendations: Vec<String>,
}

/// Tally over a list of feed sources.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceReport {
    pub total: usize,
    pub safe: usize,
    pub unsafe_sources: usize,
    /// Not safe, but nothing specific was flagged.
    pub unknown: usize,
    pub results: Vec<SourceValidation>,
}

/// Extract every URL-looking token from `text`.
pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_TOKEN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Judges links against a [`LinkPolicy`].
pub struct LinkValidator {
    policy: LinkPolicy,
    placeholders: Placeholders,
}

impl Default for LinkValidator {
    fn default() -> Self {
        Self::new(LinkPolicy::default(), Placeholders::default())
    }
}

impl LinkValidator {
    pub fn new(policy: LinkPolicy, placeholders: Placeholders) -> Self {
        Self {
            policy,
            placeholders,
        }
    }

    pub fn policy(&self) -> &LinkPolicy {
        &self.policy
    }

    /// Judge every URL embedded in a field.
    pub fn validate_urls(&self, text: &str, field: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for raw in extract_urls(text) {
            findings.extend(self.check_url(raw, field));
        }
        findings
    }

    fn check_url(&self, raw: &str, field: &str) -> Vec<Finding> {
        let parsed = match Url::parse(raw) {
            Ok(u) => u,
            Err(e) => {
                return vec![Finding {
                    kind: FindingKind::MalformedUrl,
                    severity: Severity::Medium,
                    description: format!("malformed URL: {e}"),
                    offending: raw.to_string(),
                    replacement: self.placeholders.malformed_url.clone(),
                    location: format!("{field}:url_parsing"),
                }];
            }
        };

        let host = normalize_host(parsed.host_str().unwrap_or(""));
        let mut findings = Vec::new();

        if !is_web_scheme(parsed.scheme()) {
            findings.push(Finding {
                kind: FindingKind::SuspiciousScheme,
                severity: Severity::Medium,
                description: format!("suspicious URL scheme: {}", parsed.scheme()),
                offending: raw.to_string(),
                replacement: format!("https://{}{}", host, parsed.path()),
                location: format!("{field}:scheme_validation"),
            });
        }

        if self.policy.is_denied(&host) {
            findings.push(Finding {
                kind: FindingKind::MaliciousUrl,
                severity: Severity::High,
                description: format!("URL on denied domain: {host}"),
                offending: raw.to_string(),
                replacement: self.placeholders.url.clone(),
                location: format!("{field}:url_validation"),
            });
        } else if self.policy.has_suspicious_tld(&host) {
            findings.push(Finding {
                kind: FindingKind::SuspiciousDomain,
                severity: Severity::Medium,
                description: format!("URL on suspicious top-level domain: {host}"),
                offending: raw.to_string(),
                replacement: self.placeholders.medium.clone(),
                location: format!("{field}:url_validation"),
            });
        }

        findings
    }

    /// Screen a feed source before it is fetched.
    pub fn validate_source(&self, url: &str) -> SourceValidation {
        let mut result = SourceValidation {
            url: url.to_string(),
            is_safe: false,
            trust_level: TrustLevel::Unknown,
            findings: Vec::new(),
            recommendations: Vec::new(),
        };

        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                result.findings.push(self.source_finding(
                    url,
                    FindingKind::MalformedUrl,
                    Severity::High,
                    format!("cannot parse source URL: {e}"),
                    "url_parsing",
                ));
                return result;
            }
        };

        if !is_web_scheme(parsed.scheme()) {
            result.findings.push(self.source_finding(
                url,
                FindingKind::SuspiciousScheme,
                Severity::High,
                format!("insecure protocol: {}", parsed.scheme()),
                "scheme_validation",
            ));
            return result;
        }

        let host = normalize_host(parsed.host_str().unwrap_or(""));
        let denied = self.policy.is_denied(&host);
        // Denylist wins over the allow-list.
        let trusted = !denied && self.policy.is_trusted(&host);
        result.trust_level = if trusted {
            TrustLevel::High
        } else {
            TrustLevel::Low
        };
        if !trusted && !denied {
            result
                .recommendations
                .push(format!("{host} is not on the trusted list, review it manually"));
        }

        if denied {
            result.findings.push(self.source_finding(
                url,
                FindingKind::MaliciousUrl,
                Severity::High,
                format!("source on denied domain: {host}"),
                "url_validation",
            ));
        }

        for reason in self.structural_anomalies(&parsed, &host) {
            result.findings.push(self.source_finding(
                url,
                FindingKind::SuspiciousDomain,
                Severity::Medium,
                reason,
                "domain_pattern",
            ));
        }

        if url.len() > self.policy.max_url_length {
            result.findings.push(self.source_finding(
                url,
                FindingKind::AbnormalUrlLength,
                Severity::Low,
                format!(
                    "URL is {} characters, limit {}",
                    url.len(),
                    self.policy.max_url_length
                ),
                "url_length",
            ));
        }

        let blocked = result.findings.iter().any(|f| f.severity.is_blocking());
        if blocked {
            result
                .recommendations
                .push("do not fetch this source".to_string());
        }
        result.is_safe = !blocked && (trusted || result.findings.is_empty());
        result
    }

    fn structural_anomalies(&self, parsed: &Url, host: &str) -> Vec<String> {
        let mut reasons = Vec::new();
        if self.policy.has_suspicious_tld(host) {
            reasons.push(format!("suspicious top-level domain: {host}"));
        }
        match parsed.host() {
            Some(Host::Ipv4(ip)) => {
                reasons.push(format!("raw IP address host: {ip}"));
                if ip.is_loopback() {
                    reasons.push("localhost reference".into());
                }
            }
            Some(Host::Ipv6(ip)) => {
                reasons.push(format!("raw IP address host: {ip}"));
                if ip.is_loopback() {
                    reasons.push("localhost reference".into());
                }
            }
            Some(Host::Domain(_)) => {
                if host == "localhost" || host.ends_with(".localhost") {
                    reasons.push("localhost reference".into());
                }
            }
            None => reasons.push("missing host".into()),
        }
        if matches!(parsed.host(), Some(Host::Domain(_)))
            && host
                .chars()
                .any(|c| !(c.is_alphanumeric() || c == '-' || c == '.' || c == '_'))
        {
            reasons.push(format!("unusual characters in host: {host}"));
        }
        reasons
    }

    fn source_finding(
        &self,
        url: &str,
        kind: FindingKind,
        severity: Severity,
        description: String,
        check: &str,
    ) -> Finding {
        Finding {
            kind,
            severity,
            description,
            offending: url.to_string(),
            replacement: match kind {
                FindingKind::MalformedUrl => self.placeholders.malformed_url.clone(),
                _ => self.placeholders.url.clone(),
            },
            location: format!("source:{check}"),
        }
    }

    /// Pre-fetch gate: only safe sources on the allow-list pass.
    pub fn is_trusted_feed_url(&self, url: &str) -> bool {
        let validation = self.validate_source(url);
        validation.is_safe && validation.trust_level == TrustLevel::High
    }

    /// Validate a list of feed sources and tally the verdicts.
    pub fn validate_sources<S: AsRef<str>>(&self, urls: &[S]) -> SourceReport {
        let mut report = SourceReport::default();
        for url in urls {
            let validation = self.validate_source(url.as_ref());
            report.total += 1;
            if validation.is_safe {
                report.safe += 1;
            } else if !validation.findings.is_empty() {
                report.unsafe_sources += 1;
                tracing::warn!(
                    "feed source {} rejected: {} finding(s)",
                    validation.url,
                    validation.findings.len()
                );
            } else {
                report.unknown += 1;
            }
            report.results.push(validation);
        }
        report
    }
}

fn is_web_scheme(scheme: &str) -> bool {
    scheme == "http" || scheme == "https"
}
