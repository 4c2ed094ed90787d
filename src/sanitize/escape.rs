use super::Sanitizer;

/// Layer 2: HTML entity escaping for `& < > " '`.
///
/// An ampersand that already starts a character reference is left alone,
/// which keeps the layer idempotent.
pub struct HtmlEscaper;

impl Sanitizer for HtmlEscaper {
    fn sanitize(&self, input: &str) -> String {
        escape_html(input)
    }

    fn name(&self) -> &str {
        "escape"
    }
}

/// Escape markup-significant characters, preserving existing entities.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for (i, c) in input.char_indices() {
        match c {
            '&' if entity_len(&input[i..]).is_some() => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Length of a character reference (`&name;`, `&#123;`, `&#x1F;`) at the
/// start of `s`, if there is one.
fn entity_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.first() != Some(&b'&') {
        return None;
    }
    let body = &bytes[1..];
    let (digits, allowed): (usize, fn(u8) -> bool) = match body {
        [b'#', b'x' | b'X', ..] => (2, |b| b.is_ascii_hexdigit()),
        [b'#', ..] => (1, |b| b.is_ascii_digit()),
        [b, ..] if b.is_ascii_alphabetic() => (0, |b| b.is_ascii_alphanumeric()),
        _ => return None,
    };
    let run = body[digits..].iter().take_while(|&&b| allowed(b)).count();
    if run == 0 || run > 32 {
        return None;
    }
    let end = 1 + digits + run;
    (bytes.get(end) == Some(&b';')).then_some(end + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_markup_chars() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom's & Jerry</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom&#39;s &amp; Jerry&lt;/a&gt;"
        );
    }

    #[test]
    fn test_existing_entities_kept() {
        assert_eq!(escape_html("&amp; &#39; &#x27; &nbsp;"), "&amp; &#39; &#x27; &nbsp;");
    }

    #[test]
    fn test_bare_ampersands() {
        assert_eq!(escape_html("R&D & more &;"), "R&amp;D &amp; more &amp;;");
        assert_eq!(escape_html("&#;"), "&amp;#;");
    }

    #[test]
    fn test_entity_len() {
        assert_eq!(entity_len("&lt;rest"), Some(4));
        assert_eq!(entity_len("&#x41;"), Some(6));
        assert_eq!(entity_len("&#65;"), Some(5));
        assert_eq!(entity_len("&lt"), None);
        assert_eq!(entity_len("&"), None);
    }

    #[test]
    fn test_plain_text_unchanged() {
        let input = "How to use Python for data science";
        assert_eq!(escape_html(input), input);
    }
}
