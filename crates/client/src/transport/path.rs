//! Path normalization and resolution against the configured origin.

use bizdesk_core::Error;
use url::Url;

/// Normalize an in-app path.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Empty input becomes `/`
/// 3. Ensure a leading `/`
pub fn normalize_path(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') { trimmed.to_string() } else { format!("/{trimmed}") }
}

/// Resolve an in-app path or endpoint against `base`.
///
/// The query string is kept intact. In-app paths are normalized first so a
/// relative input never resolves against a nested base path; absolute and
/// scheme-relative URLs (CDN scripts) pass through unchanged.
pub fn resolve(base: &Url, path: &str) -> Result<Url, Error> {
    let trimmed = path.trim();
    let target = if trimmed.contains("://") || trimmed.starts_with("//") {
        trimmed.to_string()
    } else {
        normalize_path(trimmed)
    };
    base.join(&target)
        .map_err(|e| Error::InvalidInput(format!("cannot resolve {path}: {e}")))
}
