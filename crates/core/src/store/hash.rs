//! Request-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request identity (method + URL).
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let a = compute_request_key("GET", "https://shop.test/app.js");
        let b = compute_request_key("get", "https://shop.test/app.js");
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_differs_by_method() {
        let get = compute_request_key("GET", "https://shop.test/api/orders");
        let post = compute_request_key("POST", "https://shop.test/api/orders");
        assert_ne!(get, post);
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", "https://shop.test/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
