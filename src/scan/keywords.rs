use std::collections::HashSet;

use aho_corasick::AhoCorasick;

use crate::error::{DigestGateError, Result};
use crate::finding::{Finding, FindingKind, Severity};

use super::{Detector, Placeholders};

/// Jailbreak vocabulary matched as whole phrases, case-insensitively.
pub struct KeywordDetector {
    automaton: AhoCorasick,
    keywords: Vec<String>,
    replacement: String,
}

impl KeywordDetector {
    /// Build from a list of phrases.
    pub fn new(keywords: Vec<String>, placeholders: &Placeholders) -> Result<Self> {
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&keywords)
            .map_err(|e| DigestGateError::InvalidKeywords {
                reason: e.to_string(),
            })?;
        Ok(Self {
            automaton,
            keywords,
            replacement: placeholders.high.clone(),
        })
    }

    /// Default AI-jailbreak phrases.
    pub fn default_keywords() -> Vec<String> {
        vec![
            "jailbreak".into(),
            "dan mode".into(),
            "developer mode".into(),
            "god mode".into(),
            "unrestricted".into(),
            "uncensored".into(),
            "no limits".into(),
            "no restrictions".into(),
            "bypass filter".into(),
            "ignore safety".into(),
            "disable ethics".into(),
        ]
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// True when the match is not glued to letters or digits on either side.
fn is_whole_phrase(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphanumeric());
    let after_ok = text[end..]
        .chars()
        .next()
        .is_none_or(|c| !c.is_alphanumeric());
    before_ok && after_ok
}

impl Detector for KeywordDetector {
    fn detect(&self, text: &str, field: &str) -> Vec<Finding> {
        if self.keywords.is_empty() {
            return Vec::new();
        }

        let mut findings = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for mat in self.automaton.find_overlapping_iter(text) {
            if !is_whole_phrase(text, mat.start(), mat.end()) {
                continue;
            }
            // One finding per distinct spelling; redaction replaces every occurrence.
            let matched = &text[mat.start()..mat.end()];
            if !seen.insert(matched.to_string()) {
                continue;
            }
            let keyword = &self.keywords[mat.pattern().as_usize()];
            findings.push(Finding {
                kind: FindingKind::AiManipulation,
                severity: Severity::High,
                description: format!("forbidden AI keyword: '{keyword}'"),
                offending: matched.to_string(),
                replacement: self.replacement.clone(),
                location: format!("{field}:keyword"),
            });
        }

        findings
    }

    fn name(&self) -> &str {
        "keywords"
    }
}
