//! Field helpers for structured logging

/// Maximum characters of provider text carried in a log event.
pub const PREVIEW_LEN: usize = 100;

/// Preview of a provider response for logging (privacy-safe).
///
/// Returns `None` unless content logging is enabled, so response text never
/// reaches the log pipeline by default.
///
/// # Examples
///
/// ```
/// use verdict::logging::content_preview;
///
/// assert_eq!(content_preview("Replace the spark plug", false), None);
/// assert_eq!(
///     content_preview("Replace the spark plug", true).as_deref(),
///     Some("Replace the spark plug")
/// );
/// ```
pub fn content_preview(text: &str, enable_content_logging: bool) -> Option<String> {
    if !enable_content_logging || text.is_empty() {
        return None;
    }
    Some(truncate(text, PREVIEW_LEN))
}

/// Truncate a string to at most `max_chars` characters, appending "..." when cut.
///
/// Cuts on a char boundary so multi-byte text never panics.
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
    }
}
