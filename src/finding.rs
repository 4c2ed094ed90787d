use serde::{Deserialize, Serialize};

/// Ordered threat level. `High` and `Critical` block admission by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// True for the severities that make a scan unsafe.
    pub fn is_blocking(&self) -> bool {
        *self >= Severity::High
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Which detector family produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    PromptInjection,
    AiManipulation,
    SuspiciousContent,
    MaliciousUrl,
    SuspiciousScheme,
    MalformedUrl,
    /// Structural anomaly in a host (odd TLD, IP literal, localhost).
    SuspiciousDomain,
    AbnormalUrlLength,
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FindingKind::PromptInjection => "prompt-injection",
            FindingKind::AiManipulation => "ai-manipulation",
            FindingKind::SuspiciousContent => "suspicious-content",
            FindingKind::MaliciousUrl => "malicious-url",
            FindingKind::SuspiciousScheme => "suspicious-scheme",
            FindingKind::MalformedUrl => "malformed-url",
            FindingKind::SuspiciousDomain => "suspicious-domain",
            FindingKind::AbnormalUrlLength => "abnormal-url-length",
        };
        f.write_str(name)
    }
}

/// One detected issue in a text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,

    /// Human-readable explanation.
    pub description: String,

    /// The substring that triggered the finding.
    pub offending: String,

    /// What the offending substring is replaced with when the finding blocks.
    pub replacement: String,

    /// `<field>:<start>-<end>` for positional matches, `<field>:<check>` otherwise.
    pub location: String,
}

/// Outcome of scanning one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    is_safe: bool,
    sanitized_text: String,
    findings: Vec<Finding>,
}

impl ScanResult {
    /// Build a result; safety is derived from the findings and cannot be set directly.
    pub fn new(sanitized_text: String, findings: Vec<Finding>) -> Self {
        let is_safe = !findings.iter().any(|f| f.severity.is_blocking());
        Self {
            is_safe,
            sanitized_text,
            findings,
        }
    }

    /// Result for empty input.
    pub fn empty() -> Self {
        Self::new(String::new(), Vec::new())
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    pub fn sanitized_text(&self) -> &str {
        &self.sanitized_text
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Take the sanitized text and findings out of the result.
    pub fn into_parts(self) -> (String, Vec<Finding>) {
        (self.sanitized_text, self.findings)
    }

    /// Highest severity among the findings, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        max_severity(&self.findings)
    }
}

/// Highest severity in a slice of findings.
pub fn max_severity(findings: &[Finding]) -> Option<Severity> {
    findings.iter().map(|f| f.severity).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            kind: FindingKind::SuspiciousContent,
            severity,
            description: "test".into(),
            offending: "x".into(),
            replacement: "y".into(),
            location: "title:0-1".into(),
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_scan_result_safety_is_derived() {
        let medium = ScanResult::new("t".into(), vec![finding(Severity::Medium)]);
        assert!(medium.is_safe());

        let high = ScanResult::new("t".into(), vec![finding(Severity::Low), finding(Severity::High)]);
        assert!(!high.is_safe());
        assert_eq!(high.max_severity(), Some(Severity::High));
    }

    #[test]
    fn test_scan_result_parts_are_read_only() {
        let result = ScanResult::new("clean".into(), vec![finding(Severity::Critical)]);
        assert_eq!(result.sanitized_text(), "clean");
        assert_eq!(result.findings().len(), 1);
        assert!(!result.is_safe());

        let (text, findings) = result.into_parts();
        assert_eq!(text, "clean");
        assert_eq!(findings, vec![finding(Severity::Critical)]);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("CRITICAL".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("severe".parse::<Severity>().is_err());
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&FindingKind::PromptInjection).unwrap();
        assert_eq!(json, "\"prompt-injection\"");
        assert_eq!(FindingKind::MalformedUrl.to_string(), "malformed-url");
    }
}
