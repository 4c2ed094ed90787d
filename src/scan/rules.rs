use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::error::{DigestGateError, Result};
use crate::finding::{Finding, FindingKind, Severity};

use super::{Detector, Placeholders};

/// One row of the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: String,
    pub kind: FindingKind,
    pub severity: Severity,
    pub description: String,
}

impl Rule {
    pub fn new(pattern: &str, kind: FindingKind, severity: Severity, description: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            kind,
            severity,
            description: description.to_string(),
        }
    }

    fn injection(pattern: &str, description: &str) -> Self {
        Self::new(
            pattern,
            FindingKind::PromptInjection,
            Severity::Critical,
            description,
        )
    }

    fn suspicious(pattern: &str, description: &str) -> Self {
        Self::new(
            pattern,
            FindingKind::SuspiciousContent,
            Severity::Medium,
            description,
        )
    }
}

/// Built-in rule table, in evaluation order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        // Instruction override
        Rule::injection(
            r"(?i)\b(?:ignore|forget|disregard)\s+(?:all\s+)?(?:the\s+|of\s+the\s+|your\s+)?(?:previous|prior|above|earlier|preceding|all)\s+(?:instructions|prompts|rules|directions)\b",
            "instruction override",
        ),
        Rule::injection(
            r"(?im)^\s*(?:new\s+)?(?:instruction|command|directive|system\s+prompt)s?\s*:",
            "injected instruction header",
        ),
        // Privilege escalation
        Rule::injection(
            r"(?i)\b(?:admin|root|sudo|system)\s*(?:override|privileges?\s+granted|access\s+granted)\b",
            "privilege escalation",
        ),
        Rule::injection(
            r"(?i)\b(?:override|bypass|circumvent|disable)\s+(?:the\s+|all\s+|your\s+)?(?:security|safety|filters?|guardrails?|moderation)\b",
            "safety override",
        ),
        // Role hijack
        Rule::injection(
            r"(?i)\b(?:act\s+as|pretend\s+(?:to\s+be|you\s+are)|roleplay\s+as|you\s+are\s+now)\s+.{0,50}?\b(?:admin|administrator|system|root|developer|unfiltered)\b",
            "role hijack",
        ),
        Rule::injection(
            r"(?i)\b(?:developer|engineer|creator|administrator)s?\s+(?:said|told|instructed|authorized)\s+(?:me|you|us)\b",
            "impersonated authority",
        ),
        // Context escape
        Rule::injection(
            r"(?i)\b(?:break|exit|escape)\s+(?:out\s+)?(?:of|from)\s+(?:the\s+|your\s+)?(?:context|sandbox|simulation|mode)\b",
            "context escape",
        ),
        Rule::injection(
            r"(?i)</?\s*(?:system|assistant|instructions?)\s*>|\[/?(?:INST|SYS)\]|<\|im_(?:start|end)\|>",
            "chat role delimiter",
        ),
        // Script injection
        Rule::injection(r"(?is)<\s*script\b[^>]*>.*?<\s*/\s*script\s*>", "script block"),
        Rule::injection(r"(?i)\bjavascript\s*:", "javascript URI"),
        Rule::injection(
            r"(?i)\bon(?:click|load|error|focus|blur|mouseover)\s*=",
            "inline event handler",
        ),
        // SQL injection
        Rule::injection(r"(?i)\bunion\s+(?:all\s+)?select\b", "SQL union select"),
        Rule::injection(
            r"(?i);\s*(?:drop|delete|truncate|alter)\s+(?:table|database|from)\b",
            "SQL statement chaining",
        ),
        Rule::injection(
            r#"(?i)['"]\s*(?:or|and)\s+(?:\d+\s*=\s*\d+|'[^']*'\s*=\s*'|"[^"]*"\s*=\s*")"#,
            "SQL tautology",
        ),
        // Command injection
        Rule::injection(
            r"(?i);\s*(?:rm|cat|wget|curl|bash|sh|nc|netcat|powershell)\s",
            "shell command chaining",
        ),
        Rule::injection(r"\$\([^)]+\)", "shell command substitution"),
        Rule::injection(
            r"(?i)(?:&&|\|\|)\s*(?:rm|wget|curl|bash|sh)\s",
            "shell conditional chaining",
        ),
        Rule::injection(
            r"(?i)\b(?:curl|wget)\s+\S+\s*\|\s*(?:ba|z)?sh\b",
            "pipe to shell",
        ),
        Rule::injection(r"(?i)\brm\s+-[rf]{1,2}\s+/", "recursive delete"),
        Rule::injection(
            r"(?i)\bsudo\s+(?:rm|chmod|chown|dd|mkfs|bash|sh|su)\b",
            "privileged shell command",
        ),
        // Credential exfiltration
        Rule::injection(
            r"(?i)\b(?:reveal|leak|print|dump|exfiltrate|output|display)\b.{0,30}?\b(?:passwords?|api\s+keys?|access\s+tokens?|bearer\s+tokens?|secrets|credentials?)\b",
            "credential exfiltration",
        ),
        // Urgency and clickbait
        Rule::suspicious(
            r"(?i)\b(?:click\s+here|limited\s+time|act\s+now|urgent)\b",
            "urgency or clickbait",
        ),
        Rule::suspicious(
            r"(?i)\b(?:emergency|immediate)\b.{0,30}?\b(?:action|response|override)\b",
            "pressure phrasing",
        ),
        // Scam and malware vocabulary
        Rule::suspicious(
            r"(?i)\b(?:phishing|scam|fraud|malware|virus)\b",
            "scam or malware keyword",
        ),
        Rule::suspicious(
            r"(?i)\b(?:cryptocurrency|bitcoin|invest\s+now|guaranteed\s+(?:profits?|returns?))\b",
            "financial lure",
        ),
        Rule::suspicious(
            r"(?i)\b(?:free\s+money|get\s+rich(?:\s+quick)?|work\s+from\s+home)\b",
            "get-rich-quick phrasing",
        ),
        // Throwaway TLDs behind links embedded in text
        Rule::suspicious(
            r"(?i)https?://[^\s/<>]+\.(?:tk|ml|ga|cf)\b",
            "link to a throwaway TLD",
        ),
    ]
}

/// Compiled rule table: a `RegexSet` prefilter plus one regex per rule for
/// match positions.
pub struct RuleSet {
    rules: Vec<Rule>,
    regex_set: RegexSet,
    patterns: Vec<Regex>,
    placeholders: Placeholders,
}

impl RuleSet {
    /// Compile a rule table.
    pub fn new(rules: Vec<Rule>, placeholders: Placeholders) -> Result<Self> {
        let regex_set =
            RegexSet::new(rules.iter().map(|r| &r.pattern)).map_err(|e| {
                DigestGateError::InvalidRule {
                    pattern: "<set>".into(),
                    reason: e.to_string(),
                }
            })?;
        let patterns = rules
            .iter()
            .map(|r| {
                Regex::new(&r.pattern).map_err(|e| DigestGateError::InvalidRule {
                    pattern: r.pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            regex_set,
            patterns,
            placeholders,
        })
    }

    pub fn default_set() -> Self {
        Self::new(default_rules(), Placeholders::default())
            .expect("default rule patterns should compile")
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Detector for RuleSet {
    fn detect(&self, text: &str, field: &str) -> Vec<Finding> {
        let matching: Vec<usize> = self.regex_set.matches(text).into_iter().collect();
        let mut findings = Vec::new();

        for idx in matching {
            let rule = &self.rules[idx];
            for m in self.patterns[idx].find_iter(text) {
                findings.push(Finding {
                    kind: rule.kind,
                    severity: rule.severity,
                    description: format!("{}: '{}'", rule.description, m.as_str()),
                    offending: m.as_str().to_string(),
                    replacement: self.placeholders.for_severity(rule.severity).to_string(),
                    location: format!("{}:{}-{}", field, m.start(), m.end()),
                });
            }
        }

        findings
    }

    fn name(&self) -> &str {
        "rules"
    }
}
