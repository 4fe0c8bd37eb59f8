//! Intercepted request metadata used for strategy selection and cache keys.

use outpost_core::RequestKey;
use reqwest::Method;
use url::Url;

/// What the request is for, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Style,
    Script,
    Image,
    Font,
    Manifest,
    Other,
}

impl Destination {
    /// Infer a destination from the URL path extension.
    pub fn from_path(path: &str) -> Self {
        let extension = path
            .rsplit('/')
            .next()
            .and_then(|segment| segment.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("css") => Destination::Style,
            Some("js" | "mjs") => Destination::Script,
            Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "avif") => Destination::Image,
            Some("woff" | "woff2" | "ttf" | "otf") => Destination::Font,
            Some("webmanifest") => Destination::Manifest,
            Some("html" | "htm") => Destination::Document,
            _ => Destination::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

/// A request the agent intercepted.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl Request {
    /// A full-page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { method: Method::GET, url, mode: RequestMode::Navigate, destination: Destination::Document }
    }

    /// A subresource GET whose destination is inferred from the path.
    pub fn get(url: Url) -> Self {
        let destination = Destination::from_path(url.path());
        Self { method: Method::GET, url, mode: RequestMode::SameOrigin, destination }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Normalized identity: uppercased method plus the URL without fragment.
    pub fn key(&self) -> RequestKey {
        let mut url = self.url.clone();
        url.set_fragment(None);
        RequestKey::new(self.method.as_str(), url.as_str())
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Style sheets, scripts and images.
    pub fn is_static_asset(&self) -> bool {
        self.method == Method::GET
            && matches!(self.destination, Destination::Style | Destination::Script | Destination::Image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_destination_from_path() {
        assert_eq!(Destination::from_path("/static/app.CSS"), Destination::Style);
        assert_eq!(Destination::from_path("/static/chunk.1a2b.js"), Destination::Script);
        assert_eq!(Destination::from_path("/icons/icon-192x192.png"), Destination::Image);
        assert_eq!(Destination::from_path("/api/orders"), Destination::Other);
        assert_eq!(Destination::from_path("/v1.2/orders"), Destination::Other);
        assert_eq!(Destination::from_path("/"), Destination::Other);
    }

    #[test]
    fn test_key_ignores_fragment() {
        let a = Request::navigate(url("https://shop.test/orders#latest")).key();
        let b = Request::navigate(url("https://shop.test/orders")).key();
        assert_eq!(a, b);
        assert_eq!(a.method, "GET");
    }

    #[test]
    fn test_asset_classification() {
        assert!(Request::get(url("https://shop.test/app.js")).is_static_asset());
        assert!(!Request::get(url("https://shop.test/api/products")).is_static_asset());
        assert!(!Request::get(url("https://shop.test/app.js")).with_method(Method::POST).is_static_asset());
        assert!(Request::navigate(url("https://shop.test/")).is_navigation());
    }
}
