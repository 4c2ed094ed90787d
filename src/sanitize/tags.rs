use regex::Regex;

use super::Sanitizer;

/// Tags removed together with everything between the open and close tag.
pub const DANGEROUS_TAGS: &[&str] = &["script", "iframe", "object", "embed", "form", "input"];

/// Inline event-handler attribute names, without the `on` prefix.
const EVENT_HANDLERS: &str = r"(?:abort|blur|change|click|contextmenu|dblclick|error|focus|input|key\w*|load|mouse\w*|pointer\w*|reset|resize|scroll|select|submit|toggle|touch\w*|unload|animation\w*)";

/// Layer 1: removes active markup.
///
/// Patterns are re-applied until the text stops changing, so a removal can
/// never splice the surrounding text into a new dangerous token.
pub struct TagStripper {
    patterns: Vec<Regex>,
}

impl Default for TagStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl TagStripper {
    pub fn new() -> Self {
        let mut sources = Vec::new();
        for tag in DANGEROUS_TAGS {
            // Paired tag with contents.
            sources.push(format!(r"(?is)<\s*{tag}\b[^>]*>.*?<\s*/\s*{tag}\s*>"));
            // Unpaired, closing or self-closing.
            sources.push(format!(r"(?i)<\s*/?\s*{tag}\b[^>]*>"));
        }
        sources.push(format!(
            r#"(?i)\bon{EVENT_HANDLERS}\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]*)"#
        ));
        sources.push(r"(?i)(?:java|vb)script\s*:".to_string());

        let patterns = sources
            .iter()
            .map(|p| Regex::new(p).expect("built-in tag patterns should compile"))
            .collect();
        Self { patterns }
    }

    fn strip_once(&self, input: &str) -> String {
        let mut result = input.to_string();
        for re in &self.patterns {
            if re.is_match(&result) {
                result = re.replace_all(&result, "").into_owned();
            }
        }
        result
    }
}

impl Sanitizer for TagStripper {
    fn sanitize(&self, input: &str) -> String {
        let mut current = input.to_string();
        loop {
            let next = self.strip_once(&current);
            // Every change strictly shortens the text, so this terminates.
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn name(&self) -> &str {
        "tags"
    }
}
