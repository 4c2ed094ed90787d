use serde::{Deserialize, Serialize};

/// Domain lists and limits used to judge links and feed sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkPolicy {
    /// Feed sources whose host contains one of these are trusted.
    pub trusted_domains: Vec<String>,

    /// Shorteners and known-bad hosts. Matches the host or any subdomain.
    pub denied_domains: Vec<String>,

    /// Top-level domains commonly used for throwaway sites.
    pub suspicious_tlds: Vec<String>,

    /// URLs longer than this are flagged.
    pub max_url_length: usize,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self {
            trusted_domains: vec![
                // Research
                "arxiv.org".into(),
                "nature.com".into(),
                "science.org".into(),
                "mit.edu".into(),
                "stanford.edu".into(),
                "berkeley.edu".into(),
                "deepmind.com".into(),
                // AI labs
                "openai.com".into(),
                "anthropic.com".into(),
                "huggingface.co".into(),
                "stability.ai".into(),
                "google.com".into(),
                "research.google".into(),
                // Press
                "techcrunch.com".into(),
                "venturebeat.com".into(),
                "wired.com".into(),
                "technologyreview.com".into(),
                "theguardian.com".into(),
                "nytimes.com".into(),
                // Learning
                "deeplearning.ai".into(),
                "coursera.org".into(),
                "kaggle.com".into(),
                "machinelearningmastery.com".into(),
                "analyticsvidhya.com".into(),
                "youtube.com".into(),
                // Communities
                "reddit.com".into(),
                "stackoverflow.com".into(),
                "github.com".into(),
                "news.ycombinator.com".into(),
            ],
            denied_domains: vec![
                "bit.ly".into(),
                "tinyurl.com".into(),
                "goo.gl".into(),
                "t.co".into(),
                "suspicious-domain.tk".into(),
                "malware-site.ml".into(),
            ],
            suspicious_tlds: vec!["tk".into(), "ml".into(), "ga".into(), "cf".into()],
            max_url_length: 500,
        }
    }
}

/// Lowercase a host and drop the trailing dots of a fully qualified name,
/// so `Bit.ly.` and `bit.ly` compare equal.
pub fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

impl LinkPolicy {
    /// Denylisted host: exact match or a subdomain of a listed domain.
    pub fn is_denied(&self, host: &str) -> bool {
        let host = normalize_host(host);
        self.denied_domains
            .iter()
            .any(|d| host == d.as_str() || host.ends_with(&format!(".{d}")))
    }

    /// Allow-list match by substring of the host.
    pub fn is_trusted(&self, host: &str) -> bool {
        let host = normalize_host(host);
        self.trusted_domains.iter().any(|d| host.contains(d.as_str()))
    }

    pub fn has_suspicious_tld(&self, host: &str) -> bool {
        let host = normalize_host(host);
        host.rsplit('.')
            .next()
            .is_some_and(|tld| self.suspicious_tlds.iter().any(|t| t.as_str() == tld))
            && host.contains('.')
    }
}
