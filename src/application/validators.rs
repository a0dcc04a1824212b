use url::Url;
use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Parses a client-supplied origin (e.g. `https://app.example.com`) for checkout redirects.
///
/// Only http(s) origins with a host are accepted; any path, query or fragment is dropped.
pub fn parse_origin(origin: &str) -> Option<String> {
    let url = Url::parse(origin.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }
    Some(url.origin().ascii_serialization())
}
