//! Common utilities for backend adapters
//!
//! Key masking and error sanitization shared by every remote provider.

/// Minimum key length to display partial key
const MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY: usize = 8;

/// Number of characters to show at start/end of masked key
const KEY_MASK_VISIBLE_CHARS: usize = 4;

/// Longest error message passed through unchanged
const MAX_ERROR_LENGTH: usize = 300;

/// Mask API key for safe display in logs
///
/// Shows first 4 and last 4 characters for keys longer than 8 characters,
/// otherwise shows "****".
///
/// # Examples
/// ```
/// use switchboard_llm::util::mask_api_key;
/// assert_eq!(mask_api_key("sk-1234567890abcdef"), "sk-1...cdef");
/// assert_eq!(mask_api_key("short"), "****");
/// ```
#[must_use]
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= MIN_KEY_LENGTH_FOR_PARTIAL_DISPLAY || !key.is_ascii() {
        return "****".to_string();
    }
    format!(
        "{}...{}",
        &key[..KEY_MASK_VISIBLE_CHARS],
        &key[key.len() - KEY_MASK_VISIBLE_CHARS..]
    )
}

/// Mask an optional API key
#[must_use]
pub fn mask_optional_key(key: Option<&str>) -> String {
    key.map(mask_api_key).unwrap_or_else(|| "<unset>".to_string())
}

/// Truncate a string to at most `max_bytes`, respecting char boundaries
#[must_use]
pub fn truncate_safe(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Sanitize a remote API error before it reaches logs or callers
///
/// Authentication failures never echo the server message, since vendors
/// sometimes include the offending key.
///
/// # Examples
/// ```
/// use switchboard_llm::util::sanitize_api_error;
/// assert_eq!(
///     sanitize_api_error("Invalid api key provided"),
///     "API authentication error. Please check your API key configuration."
/// );
/// assert_eq!(sanitize_api_error("Connection timeout"), "Connection timeout");
/// ```
#[must_use]
pub fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("api_key")
        || lower.contains("x-api-key")
        || lower.contains("invalid key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
    {
        return "API authentication error. Please check your API key configuration.".to_string();
    }

    if lower.contains("rate limit") || lower.contains("quota") || lower.contains("overloaded") {
        return "API rate limit exceeded. Please try again later.".to_string();
    }

    if error.len() > MAX_ERROR_LENGTH {
        format!("{}...(truncated)", truncate_safe(error, MAX_ERROR_LENGTH))
    } else {
        error.to_string()
    }
}
