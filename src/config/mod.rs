//! Configuration module for getjs
//!
//! Configuration comes from an optional TOML file, with command-line flags
//! layered on top by the binary. Every key has a default, so an empty file
//! (or no file at all) is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use getjs::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("getjs.toml")).unwrap();
//! println!("Fetching with {} threads", config.pipeline.threads);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ExtractionPoints, PipelineOptions, RequestConfig, RequestSection,
    DEFAULT_THREADS, DEFAULT_TIMEOUT_SECS,
};

// Re-export parser functions
pub use parser::{load_config, parse_config, parse_header};
pub use validation::validate;
