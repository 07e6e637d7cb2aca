//! URL resolution for precache entries and intercepted requests.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve an asset entry against the application scope.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs (cross-origin libraries) are kept, relative ones joined onto `scope`
/// 3. Only http and https are accepted
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(scope: &Url, entry: &str) -> Result<Url, UrlError> {
    let trimmed = entry.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut resolved = scope.join(trimmed).map_err(|e| UrlError::InvalidUrl(format!("{trimmed}: {e}")))?;

    match resolved.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    resolved.set_fragment(None);

    Ok(resolved)
}

/// Whether `url` shares scheme, host and port with `scope`.
pub fn same_origin(scope: &Url, url: &Url) -> bool {
    scope.origin() == url.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Url {
        Url::parse("https://app.test/shop/").unwrap()
    }

    #[test]
    fn test_resolve_dot_slash() {
        assert_eq!(resolve(&scope(), "./").unwrap().as_str(), "https://app.test/shop/");
        assert_eq!(resolve(&scope(), "./index.html").unwrap().as_str(), "https://app.test/shop/index.html");
    }

    #[test]
    fn test_resolve_nested_path() {
        let url = resolve(&scope(), "./icons/icon-192.png").unwrap();
        assert_eq!(url.path(), "/shop/icons/icon-192.png");
    }

    #[test]
    fn test_resolve_absolute_cross_origin() {
        let url = resolve(&scope(), "https://cdn.jsdelivr.net/npm/@supabase/supabase-js@2").unwrap();
        assert_eq!(url.host_str(), Some("cdn.jsdelivr.net"));
        assert_eq!(url.path(), "/npm/@supabase/supabase-js@2");
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve(&scope(), "https://CDN.Example.COM/lib.js").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
    }

    #[test]
    fn test_resolve_remove_fragment() {
        let url = resolve(&scope(), "./index.html#top").unwrap();
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_resolve_preserve_query() {
        let url = resolve(&scope(), "./app.js?b=2&a=1").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&scope(), "  ./manifest.json  ").unwrap();
        assert_eq!(url.as_str(), "https://app.test/shop/manifest.json");
    }

    #[test]
    fn test_resolve_unsupported_scheme() {
        let result = resolve(&scope(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&scope(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&scope(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin() {
        let scope = scope();
        assert!(same_origin(&scope, &Url::parse("https://app.test/app.js").unwrap()));
        assert!(!same_origin(&scope, &Url::parse("http://app.test/app.js").unwrap()));
        assert!(!same_origin(&scope, &Url::parse("https://cdn.test/app.js").unwrap()));
    }
}
