use crate::config::types::Config;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// The result is not validated: command-line flags are layered on top
/// first, and [`validate`](crate::config::validate) runs on the merged value.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(ConfigError)` - Failed to read or parse the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text, filling in defaults
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Splits a `Key: Value` header line at the first colon
///
/// Values may themselves contain colons (`Referer: https://example.com/`).
///
/// # Example
///
/// ```
/// use getjs::config::parse_header;
///
/// let (name, value) = parse_header("Referer: https://example.com/").unwrap();
/// assert_eq!(name.as_str(), "referer");
/// assert_eq!(value, "https://example.com/");
/// ```
pub fn parse_header(line: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| ConfigError::InvalidHeader(format!("missing ':' in '{}'", line)))?;

    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| ConfigError::InvalidHeader(format!("bad header name in '{}': {}", line, e)))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| ConfigError::InvalidHeader(format!("bad header value in '{}': {}", line, e)))?;

    Ok((name, value))
}
