//! Filename sanitization for downloaded documents.
//!
//! Suppliers hand the pipeline raw names lifted from URLs or search results:
//! percent-encoded, possibly containing path separators or other characters
//! illegal on common filesystems. This module turns them into safe, stable
//! `.pdf` filenames.

/// The extension every accepted artifact carries.
const PDF_EXTENSION: &str = ".pdf";

/// Turns an arbitrary URL-derived string into a safe `.pdf` filename.
///
/// Steps, in order:
/// 1. Percent-decode the input (`doc%20A` becomes `doc A`).
/// 2. Strip characters illegal in filesystem paths (`< > : " / \ | ? *`)
///    and control characters.
/// 3. Ensure a `.pdf` extension, checked case-insensitively and appended
///    when absent.
///
/// Total function: an input that is empty after stripping falls back to a
/// timestamp-generated name so distinct bad inputs do not collide on an
/// empty filename.
#[must_use]
pub fn sanitize_document_name(raw: &str) -> String {
    let decoded = urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string());

    let stripped: String = decoded
        .chars()
        .filter(|c| {
            !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') && !c.is_control()
        })
        .collect();
    let stripped = stripped.trim();

    let base = if stripped.is_empty() {
        generated_name()
    } else {
        stripped.to_string()
    };

    if base.to_lowercase().ends_with(PDF_EXTENSION) {
        base
    } else {
        format!("{base}{PDF_EXTENSION}")
    }
}

/// Fallback name for inputs with no usable characters.
fn generated_name() -> String {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("document_{timestamp}")
}
