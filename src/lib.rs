//! getjs: find the JavaScript a web page loads
//!
//! This crate fetches pages concurrently, scans their markup for script
//! locations, optionally completes relative locations into absolute URLs,
//! optionally keeps only locations that resolve, and streams the results to
//! one or more sinks.

pub mod config;
pub mod crawler;
pub mod input;
pub mod logging;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for getjs operations
///
/// Every pipeline variant is local to one page or one candidate: it is
/// logged and the run moves on to the remaining work.
#[derive(Debug, Error)]
pub enum GetJsError {
    #[error("Invalid input line '{line}': {source}")]
    Input { line: String, source: UrlError },

    #[error("HTTP error for {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("{url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTML parse error: {0}")]
    Parse(String),

    #[error("Invalid attribute value: {0}")]
    Extraction(#[from] UrlError),

    #[error("{url} does not resolve: {reason}")]
    Resolution { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid request method: {0}")]
    InvalidMethod(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("'{value}' is not a valid URL: {source}")]
    Parse {
        value: String,
        source: ::url::ParseError,
    },

    #[error("Unsupported URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for getjs operations
pub type Result<T> = std::result::Result<T, GetJsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, ExtractionPoints, PipelineOptions, RequestConfig};
pub use crawler::{Runner, RunSummary};
pub use input::WorkItem;
pub use logging::Diagnostics;
pub use state::ItemState;
pub use url::{complete, Candidate};
