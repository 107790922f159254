//! Crawler module: the concurrent fetch, scan and filter pipeline
//!
//! This module contains:
//! - HTTP page fetching with the configured method, headers and timeout
//! - Lazy markup scanning for script locations
//! - Liveness resolution of completed script URLs
//! - The bounded dispatcher that ties them together

mod coordinator;
mod fetcher;
mod resolver;
mod scanner;

pub use coordinator::{RunSummary, Runner};
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher};
pub use resolver::{HttpResolver, Resolver};
pub use scanner::{scan, Candidates};
