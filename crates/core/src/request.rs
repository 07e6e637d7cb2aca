//! Intercepted request descriptors and cache identities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::cache::hash::compute_cache_key;

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Extension(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Extension(m) => m,
        }
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            other => Method::Extension(other.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request mode as reported by the interception runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// What the requested resource will be used for (the Fetch "destination").
///
/// `Empty` is what plain XHR/fetch calls report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    #[serde(rename = "")]
    Empty,
    Audio,
    AudioWorklet,
    Document,
    Embed,
    Font,
    Frame,
    Iframe,
    Image,
    Manifest,
    Object,
    PaintWorklet,
    Report,
    Script,
    ServiceWorker,
    SharedWorker,
    Style,
    Track,
    Video,
    Worker,
    Xslt,
}

impl Destination {
    const ALL: [Destination; 21] = [
        Destination::Empty,
        Destination::Audio,
        Destination::AudioWorklet,
        Destination::Document,
        Destination::Embed,
        Destination::Font,
        Destination::Frame,
        Destination::Iframe,
        Destination::Image,
        Destination::Manifest,
        Destination::Object,
        Destination::PaintWorklet,
        Destination::Report,
        Destination::Script,
        Destination::ServiceWorker,
        Destination::SharedWorker,
        Destination::Style,
        Destination::Track,
        Destination::Video,
        Destination::Worker,
        Destination::Xslt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Destination::Empty => "",
            Destination::Audio => "audio",
            Destination::AudioWorklet => "audioworklet",
            Destination::Document => "document",
            Destination::Embed => "embed",
            Destination::Font => "font",
            Destination::Frame => "frame",
            Destination::Iframe => "iframe",
            Destination::Image => "image",
            Destination::Manifest => "manifest",
            Destination::Object => "object",
            Destination::PaintWorklet => "paintworklet",
            Destination::Report => "report",
            Destination::Script => "script",
            Destination::ServiceWorker => "serviceworker",
            Destination::SharedWorker => "sharedworker",
            Destination::Style => "style",
            Destination::Track => "track",
            Destination::Video => "video",
            Destination::Worker => "worker",
            Destination::Xslt => "xslt",
        }
    }
}

impl FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| Error::InvalidRequest(format!("unknown destination: {s}")))
    }
}

/// An intercepted outgoing request.
///
/// Built once per interception and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    url: Url,
    method: Method,
    mode: RequestMode,
    destination: Destination,
}

impl RequestDescriptor {
    pub fn new(url: Url, method: Method, mode: RequestMode, destination: Destination) -> Self {
        Self { url, method, mode, destination }
    }

    /// A plain GET with `cors` mode and an empty destination.
    pub fn get(url: Url) -> Self {
        Self::new(url, Method::Get, RequestMode::Cors, Destination::Empty)
    }

    /// Parse `url` and build a GET descriptor.
    pub fn parse_get(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        Ok(Self::get(url))
    }

    /// A top-level page navigation.
    pub fn navigate(url: Url) -> Self {
        Self::new(url, Method::Get, RequestMode::Navigate, Destination::Document)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    pub fn destination(&self) -> Destination {
        self.destination
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// The identity this request is stored and looked up under.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), &self.url)
    }
}

/// Identity of a cache entry: method plus URL without its fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: Method,
    url: Url,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method, url }
    }

    /// The GET identity for `url`.
    pub fn get(url: &Url) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Stable hex digest used as the storage key.
    pub fn digest(&self) -> String {
        compute_cache_key(self.method.as_str(), self.url.as_str())
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
