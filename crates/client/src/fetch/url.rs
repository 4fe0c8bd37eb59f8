//! URL canonicalization for consistent cache keys and window matching.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an absolute URL string.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    normalize(parsed)
}

/// Resolve a possibly relative link against the application origin, then
/// canonicalize it. Absolute links are kept as they are.
pub fn resolve(origin: &url::Url, link: &str) -> Result<url::Url, UrlError> {
    let trimmed = link.trim();

    if trimmed.is_empty() {
        return normalize(origin.clone());
    }

    let joined = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    normalize(joined)
}

fn normalize(mut parsed: url::Url) -> Result<url::Url, UrlError> {
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("https://shop.test").unwrap()
    }

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize("https://shop.test").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("shop.test"));
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("shop.test").unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_canonicalize_lowercase_host_and_strip_fragment() {
        let url = canonicalize("https://SHOP.TEST/orders?id=7#top").unwrap();
        assert_eq!(url.as_str(), "https://shop.test/orders?id=7");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_relative_link() {
        let url = resolve(&origin(), "/customer/chat").unwrap();
        assert_eq!(url.as_str(), "https://shop.test/customer/chat");
    }

    #[test]
    fn test_resolve_absolute_link_kept() {
        let url = resolve(&origin(), "https://other.test/x#frag").unwrap();
        assert_eq!(url.as_str(), "https://other.test/x");
    }

    #[test]
    fn test_resolve_empty_link_is_origin() {
        let url = resolve(&origin(), "").unwrap();
        assert_eq!(url.as_str(), "https://shop.test/");
    }
}
