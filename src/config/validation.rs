use crate::config::types::{Config, ExtractionPoints, PipelineOptions, RequestSection};
use crate::config::parser::parse_header;
use crate::ConfigError;
use reqwest::Method;

/// Upper bound on the worker pool size
const MAX_THREADS: usize = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_request(&config.request)?;
    validate_pipeline(&config.pipeline)?;
    validate_extraction(&config.extraction)?;
    Ok(())
}

/// Validates request settings
fn validate_request(request: &RequestSection) -> Result<(), ConfigError> {
    Method::from_bytes(request.method.as_bytes())
        .map_err(|_| ConfigError::InvalidMethod(request.method.clone()))?;

    if request.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    for line in &request.headers {
        parse_header(line)?;
    }

    Ok(())
}

/// Validates pipeline options
fn validate_pipeline(pipeline: &PipelineOptions) -> Result<(), ConfigError> {
    if pipeline.threads < 1 || pipeline.threads > MAX_THREADS {
        return Err(ConfigError::Validation(format!(
            "threads must be between 1 and {}, got {}",
            MAX_THREADS, pipeline.threads
        )));
    }

    if pipeline.resolve && !pipeline.complete {
        return Err(ConfigError::Validation(
            "resolve can only be used in combination with complete".to_string(),
        ));
    }

    Ok(())
}

/// Validates extraction points
fn validate_extraction(points: &ExtractionPoints) -> Result<(), ConfigError> {
    if points.is_empty() {
        return Err(ConfigError::Validation(
            "at least one extraction point is required".to_string(),
        ));
    }

    for (tag, attributes) in points.iter() {
        if tag.trim().is_empty() {
            return Err(ConfigError::Validation(
                "extraction tag names cannot be empty".to_string(),
            ));
        }

        if attributes.is_empty() || attributes.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "extraction point '{}' needs at least one non-empty attribute",
                tag
            )));
        }
    }

    Ok(())
}
