use crate::config::parser::parse_header;
use crate::ConfigError;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Default number of pages fetched in parallel
pub const DEFAULT_THREADS: usize = 2;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Main configuration structure for getjs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub request: RequestSection,
    #[serde(default)]
    pub pipeline: PipelineOptions,
    #[serde(default)]
    pub extraction: ExtractionPoints,
}

impl Config {
    /// Builds the immutable request configuration shared by every fetch task
    pub fn request_config(&self) -> Result<RequestConfig, ConfigError> {
        let method = Method::from_bytes(self.request.method.as_bytes())
            .map_err(|_| ConfigError::InvalidMethod(self.request.method.clone()))?;

        let mut headers = HeaderMap::new();
        for line in &self.request.headers {
            let (name, value) = parse_header(line)?;
            headers.append(name, value);
        }

        Ok(RequestConfig {
            method,
            headers,
            timeout: Duration::from_secs(self.request.timeout),
            insecure: self.request.insecure,
        })
    }
}

/// Request settings as written in the configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestSection {
    /// HTTP method used for page fetches
    pub method: String,

    /// Extra headers in `Key: Value` form
    pub headers: Vec<String>,

    /// Per-request timeout (seconds)
    pub timeout: u64,

    /// Skip TLS certificate verification
    pub insecure: bool,
}

impl Default for RequestSection {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT_SECS,
            insecure: false,
        }
    }
}

/// Which filter stages run and how many pages are fetched at once
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Rewrite relative script locations into absolute URLs
    pub complete: bool,

    /// Keep only script locations that answer with a 2xx status
    pub resolve: bool,

    /// Maximum number of work items in flight
    pub threads: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            complete: false,
            resolve: false,
            threads: DEFAULT_THREADS,
        }
    }
}

/// Typed, immutable request configuration
///
/// Built once before the pipeline starts and shared read-only by every task.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: Method,
    pub headers: HeaderMap,
    pub timeout: Duration,
    pub insecure: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            insecure: false,
        }
    }
}

/// Tag names mapped to the attributes scanned for script locations
///
/// Tag and attribute names are stored lowercase since the HTML parser
/// lowercases both. Defaults to `script` with `src` and `data-src`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "HashMap<String, Vec<String>>")]
pub struct ExtractionPoints {
    points: HashMap<String, Vec<String>>,
}

impl ExtractionPoints {
    /// Creates an empty set of extraction points
    pub fn empty() -> Self {
        Self {
            points: HashMap::new(),
        }
    }

    /// Adds (or replaces) the attributes scanned on a tag
    pub fn insert<I, S>(&mut self, tag: &str, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.points.insert(
            tag.to_ascii_lowercase(),
            attributes
                .into_iter()
                .map(|attribute| attribute.into().to_ascii_lowercase())
                .collect(),
        );
    }

    /// Builder-style variant of [`ExtractionPoints::insert`]
    pub fn with<I, S>(mut self, tag: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(tag, attributes);
        self
    }

    /// Attributes to scan on the given (lowercase) tag, if it is an extraction point
    pub fn attributes(&self, tag: &str) -> Option<&[String]> {
        self.points.get(tag).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.points
            .iter()
            .map(|(tag, attributes)| (tag.as_str(), attributes.as_slice()))
    }
}

impl Default for ExtractionPoints {
    fn default() -> Self {
        Self::empty().with("script", ["src", "data-src"])
    }
}

impl From<HashMap<String, Vec<String>>> for ExtractionPoints {
    fn from(raw: HashMap<String, Vec<String>>) -> Self {
        raw.into_iter()
            .fold(Self::empty(), |points, (tag, attributes)| {
                points.with(&tag, attributes)
            })
    }
}
