//! Request classification.
//!
//! Every intercepted GET request falls into exactly one [`RequestCategory`].
//! The checks run in a fixed order, first match wins:
//!
//! 1. Document: navigation, `document` destination, or a path ending in the document entry
//! 2. RemoteData: backend host suffix, or an API path segment on any host
//! 3. StaticAsset: one of the configured destinations
//! 4. Other
//!
//! RemoteData is checked before StaticAsset so an API call is never served
//! from cache, whatever destination it reports.

use std::collections::HashSet;
use std::fmt;

use shellcache_core::{Destination, Method, RequestDescriptor, ShellConfig};

/// What kind of traffic a request is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestCategory {
    Document,
    RemoteData,
    StaticAsset,
    Other,
}

/// How a category is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkOnly,
    NetworkFirst,
    CacheFirst,
}

impl RequestCategory {
    pub fn strategy(self) -> Strategy {
        match self {
            RequestCategory::Document => Strategy::NetworkFirst,
            RequestCategory::StaticAsset => Strategy::CacheFirst,
            RequestCategory::RemoteData | RequestCategory::Other => Strategy::NetworkOnly,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestCategory::Document => "document",
            RequestCategory::RemoteData => "remote-data",
            RequestCategory::StaticAsset => "static-asset",
            RequestCategory::Other => "other",
        }
    }
}

impl fmt::Display for RequestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure request classifier built from configuration.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// `/` + document entry filename
    document_suffix: String,
    remote_host_suffixes: Vec<String>,
    api_path_segments: Vec<String>,
    static_destinations: HashSet<Destination>,
}

impl Classifier {
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            document_suffix: format!("/{}", config.document_entry),
            remote_host_suffixes: config.remote_host_suffixes.clone(),
            api_path_segments: config.api_path_segments.clone(),
            static_destinations: config.static_destinations.iter().copied().collect(),
        }
    }

    /// Category for an intercepted request, or `None` when the request is
    /// not intercepted at all (anything but GET) and the runtime should
    /// apply its default behavior.
    pub fn route(&self, request: &RequestDescriptor) -> Option<RequestCategory> {
        if *request.method() != Method::Get {
            return None;
        }
        Some(self.classify(request))
    }

    /// Category for `request`, regardless of method.
    pub fn classify(&self, request: &RequestDescriptor) -> RequestCategory {
        if self.is_document(request) {
            RequestCategory::Document
        } else if self.is_remote_data(request) {
            RequestCategory::RemoteData
        } else if self.is_static_asset(request) {
            RequestCategory::StaticAsset
        } else {
            RequestCategory::Other
        }
    }

    fn is_document(&self, request: &RequestDescriptor) -> bool {
        request.is_navigation()
            || request.destination() == Destination::Document
            || request.url().path().ends_with(&self.document_suffix)
    }

    // Path segments match on any host, same-origin included.
    fn is_remote_data(&self, request: &RequestDescriptor) -> bool {
        let url = request.url();
        let host_matches = url
            .host_str()
            .is_some_and(|host| self.remote_host_suffixes.iter().any(|suffix| host.ends_with(suffix.as_str())));
        host_matches || self.api_path_segments.iter().any(|segment| url.path().contains(segment.as_str()))
    }

    fn is_static_asset(&self, request: &RequestDescriptor) -> bool {
        self.static_destinations.contains(&request.destination())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellcache_core::RequestMode;
    use url::Url;

    fn classifier() -> Classifier {
        Classifier::new(&ShellConfig::for_scope("https://app.test/"))
    }

    fn get(url: &str, destination: Destination) -> RequestDescriptor {
        RequestDescriptor::parse_get(url).unwrap().with_destination(destination)
    }

    #[test]
    fn test_navigation_is_document() {
        let req = RequestDescriptor::navigate(Url::parse("https://app.test/orders?id=4").unwrap());
        assert_eq!(classifier().classify(&req), RequestCategory::Document);
    }

    #[test]
    fn test_document_destination_is_document() {
        let req = get("https://app.test/embed", Destination::Document).with_mode(RequestMode::SameOrigin);
        assert_eq!(classifier().classify(&req), RequestCategory::Document);
    }

    #[test]
    fn test_index_path_is_document() {
        let req = get("https://app.test/shop/index.html", Destination::Empty);
        assert_eq!(classifier().classify(&req), RequestCategory::Document);
    }

    #[test]
    fn test_index_suffix_requires_slash() {
        let req = get("https://app.test/myindex.html", Destination::Empty);
        assert_eq!(classifier().classify(&req), RequestCategory::Other);
    }

    #[test]
    fn test_backend_host_is_remote_data() {
        let req = get("https://xyz.supabase.co/rest/v1/items?select=*", Destination::Empty);
        assert_eq!(classifier().classify(&req), RequestCategory::RemoteData);
        let req = get("https://xyz.supabase.co/functions/report", Destination::Empty);
        assert_eq!(classifier().classify(&req), RequestCategory::RemoteData);
    }

    #[test]
    fn test_api_segment_on_any_host_is_remote_data() {
        for path in ["/rest/v1/items", "/auth/v1/token", "/storage/v1/object/a.png"] {
            let req = get(&format!("https://api.app.test{path}"), Destination::Empty);
            assert_eq!(classifier().classify(&req), RequestCategory::RemoteData, "{path}");
        }
    }

    #[test]
    fn test_remote_data_beats_static_destination() {
        let req = get("https://xyz.supabase.co/storage/v1/object/public/logo.png", Destination::Image);
        assert_eq!(classifier().classify(&req), RequestCategory::RemoteData);
    }

    #[test]
    fn test_static_destinations() {
        for destination in [
            Destination::Script,
            Destination::Style,
            Destination::Image,
            Destination::Font,
            Destination::Manifest,
        ] {
            let req = get("https://app.test/asset", destination);
            assert_eq!(classifier().classify(&req), RequestCategory::StaticAsset, "{destination:?}");
        }
    }

    #[test]
    fn test_cross_origin_library_is_static() {
        let req = get("https://cdn.jsdelivr.net/npm/@supabase/supabase-js@2", Destination::Script);
        assert_eq!(classifier().classify(&req), RequestCategory::StaticAsset);
    }

    #[test]
    fn test_plain_fetch_is_other() {
        let req = get("https://app.test/data/export.csv", Destination::Empty);
        assert_eq!(classifier().classify(&req), RequestCategory::Other);
        let req = get("https://app.test/clip.mp4", Destination::Video);
        assert_eq!(classifier().classify(&req), RequestCategory::Other);
    }

    #[test]
    fn test_route_skips_non_get() {
        let classifier = classifier();
        for method in [Method::Post, Method::Put, Method::Delete, Method::Head, Method::Patch] {
            let req = get("https://app.test/app.js", Destination::Script).with_method(method.clone());
            assert_eq!(classifier.route(&req), None, "{method}");
        }
        let req = get("https://app.test/app.js", Destination::Script);
        assert_eq!(classifier.route(&req), Some(RequestCategory::StaticAsset));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let classifier = classifier();
        let req = get("https://app.test/style.css", Destination::Style);
        let first = classifier.classify(&req);
        assert!((0..10).all(|_| classifier.classify(&req) == first));
    }

    #[test]
    fn test_custom_configuration() {
        let config = ShellConfig {
            document_entry: "app.html".into(),
            remote_host_suffixes: vec!["backend.test".into()],
            api_path_segments: vec!["/graphql".into()],
            static_destinations: vec![Destination::Script],
            ..ShellConfig::for_scope("https://app.test/")
        };
        let classifier = Classifier::new(&config);

        assert_eq!(classifier.classify(&get("https://app.test/app.html", Destination::Empty)), RequestCategory::Document);
        assert_eq!(classifier.classify(&get("https://app.test/index.html", Destination::Empty)), RequestCategory::Other);
        assert_eq!(classifier.classify(&get("https://eu.backend.test/x", Destination::Script)), RequestCategory::RemoteData);
        assert_eq!(classifier.classify(&get("https://app.test/graphql", Destination::Empty)), RequestCategory::RemoteData);
        assert_eq!(classifier.classify(&get("https://app.test/a.css", Destination::Style)), RequestCategory::Other);
    }

    #[test]
    fn test_strategy_table() {
        assert_eq!(RequestCategory::Document.strategy(), Strategy::NetworkFirst);
        assert_eq!(RequestCategory::StaticAsset.strategy(), Strategy::CacheFirst);
        assert_eq!(RequestCategory::RemoteData.strategy(), Strategy::NetworkOnly);
        assert_eq!(RequestCategory::Other.strategy(), Strategy::NetworkOnly);
    }
}
