//! Free-text input parsing.
//!
//! The CLI accepts pasted text (arguments or stdin) and extracts the inputs
//! it understands: direct HTTP/HTTPS URLs and DOIs. Everything else is
//! skipped and reported, never fatal.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"']+"#).expect("static URL regex must compile")
});

#[allow(clippy::expect_used)]
static DOI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b10\.\d{4,9}/[-._;()/:a-zA-Z0-9]+").expect("static DOI regex must compile")
});

/// Type of input detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Direct HTTP/HTTPS URL
    Url,
    /// DOI identifier, resolved to a PDF URL via the open-access resolver
    Doi,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => write!(f, "URL"),
            Self::Doi => write!(f, "DOI"),
        }
    }
}

/// A single parsed item from input.
#[derive(Debug, Clone)]
pub struct ParsedItem {
    /// Original input line
    pub raw: String,
    /// Detected input type
    pub kind: InputKind,
    /// Extracted/normalized value (validated URL or bare DOI)
    pub value: String,
}

/// Collection of parsed items from input.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Successfully parsed items, in input order
    pub items: Vec<ParsedItem>,
    /// Lines that could not be parsed (for logging)
    pub skipped: Vec<String>,
}

impl ParseResult {
    /// Returns true if no items were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns count of parsed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns count of skipped lines.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Parses free text into URL and DOI items, line by line.
///
/// A line yields at most one item: an embedded URL wins over a DOI match on
/// the same line (the URL is the more specific instruction). Blank lines and
/// `#` comments are ignored silently; anything else unrecognized lands in
/// `skipped`.
#[must_use]
pub fn parse_input(text: &str) -> ParseResult {
    let mut result = ParseResult::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(found) = URL_PATTERN.find(line) {
            let raw_url = found.as_str().trim_end_matches(['.', ',', ')', ']']);
            if Url::parse(raw_url).is_ok() {
                result.items.push(ParsedItem {
                    raw: line.to_string(),
                    kind: InputKind::Url,
                    value: raw_url.to_string(),
                });
                continue;
            }
        }

        if let Some(doi) = extract_doi(line) {
            result.items.push(ParsedItem {
                raw: line.to_string(),
                kind: InputKind::Doi,
                value: doi,
            });
            continue;
        }

        result.skipped.push(line.to_string());
    }

    result
}

/// Extracts and normalizes a bare DOI from a line.
///
/// Accepts `doi:` prefixes and plain `10.xxxx/suffix` forms. Trailing
/// punctuation common in pasted references is trimmed.
fn extract_doi(line: &str) -> Option<String> {
    let found = DOI_PATTERN.find(line)?;
    let doi = found.as_str().trim_end_matches(['.', ',', ';', ')', ']']);
    (!doi.is_empty()).then(|| doi.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_plain_urls() {
        let result = parse_input("https://a.example/one.pdf\nhttps://b.example/two.pdf");
        assert_eq!(result.len(), 2);
        assert_eq!(result.items[0].kind, InputKind::Url);
        assert_eq!(result.items[0].value, "https://a.example/one.pdf");
        assert_eq!(result.skipped_count(), 0);
    }

    #[test]
    fn test_parse_input_url_embedded_in_text() {
        let result = parse_input("see https://a.example/doc.pdf for details");
        assert_eq!(result.len(), 1);
        assert_eq!(result.items[0].value, "https://a.example/doc.pdf");
    }

    #[test]
    fn test_parse_input_doi_forms() {
        let result = parse_input("doi:10.1000/xyz123\n10.1234/abc.def");
        assert_eq!(result.len(), 2);
        assert_eq!(result.items[0].kind, InputKind::Doi);
        assert_eq!(result.items[0].value, "10.1000/xyz123");
        assert_eq!(result.items[1].value, "10.1234/abc.def");
    }

    #[test]
    fn test_parse_input_doi_url_is_treated_as_url() {
        let result = parse_input("https://doi.org/10.1000/xyz123");
        assert_eq!(result.len(), 1);
        assert_eq!(result.items[0].kind, InputKind::Url);
    }

    #[test]
    fn test_parse_input_skips_unrecognized_lines() {
        let result = parse_input("just some prose\n\n# a comment\nhttps://a.example/x.pdf");
        assert_eq!(result.len(), 1);
        assert_eq!(result.skipped, vec!["just some prose".to_string()]);
    }

    #[test]
    fn test_parse_input_trims_trailing_punctuation() {
        let result = parse_input("(see https://a.example/doc.pdf).\n10.1000/xyz123.");
        assert_eq!(result.items[0].value, "https://a.example/doc.pdf");
        assert_eq!(result.items[1].value, "10.1000/xyz123");
    }

    #[test]
    fn test_parse_input_empty() {
        let result = parse_input("");
        assert!(result.is_empty());
        assert_eq!(result.len(), 0);
    }
}
