use url::Url;
use crate::error::{AppError, Result};

/// Returns `true` if `input` parses as an absolute URL with an http or https scheme.
pub fn is_http_url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(parsed) => parsed.scheme() == "http" || parsed.scheme() == "https",
        Err(_) => false,
    }
}

/// Normalizes a user-submitted destination URL.
///
/// Trims whitespace and prepends `https://` when no scheme is present, then
/// requires the result to be an absolute http/https URL.
pub fn normalize_destination(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("URL is required".to_string()));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    if !is_http_url(&candidate) {
        return Err(AppError::InvalidUrl);
    }

    Ok(candidate)
}
