use crate::UrlError;
use std::fmt;
use url::{ParseError, Url};

/// Base used only to check that a relative reference is syntactically valid
const PROBE_BASE: &str = "http://probe.invalid/";

/// A script location found in markup, not yet completed or resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    value: String,
    absolute: bool,
}

impl Candidate {
    /// Parses a raw attribute value into a candidate
    ///
    /// Absolute URLs are kept verbatim. Relative references (protocol-relative,
    /// absolute-path or bare paths) are accepted when they would join cleanly
    /// onto a base URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use getjs::url::Candidate;
    ///
    /// assert!(Candidate::parse("https://cdn.example.com/app.js").unwrap().is_absolute());
    /// assert!(!Candidate::parse("//cdn.example.com/app.js").unwrap().is_absolute());
    /// assert!(Candidate::parse("http://[broken/app.js").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let value = raw.trim();

        match Url::parse(value) {
            Ok(_) => Ok(Self::absolute(value)),
            Err(ParseError::RelativeUrlWithoutBase) => {
                Url::parse(PROBE_BASE)
                    .and_then(|probe| probe.join(value))
                    .map_err(|source| UrlError::Parse {
                        value: value.to_string(),
                        source,
                    })?;
                Ok(Self {
                    value: value.to_string(),
                    absolute: false,
                })
            }
            Err(source) => Err(UrlError::Parse {
                value: value.to_string(),
                source,
            }),
        }
    }

    /// Wraps a value already known to be an absolute URL
    pub(crate) fn absolute(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            absolute: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn into_string(self) -> String {
        self.value
    }

    /// Parses the candidate as a full URL; fails for relative candidates
    pub fn to_url(&self) -> Result<Url, UrlError> {
        Url::parse(&self.value).map_err(|source| UrlError::Parse {
            value: self.value.clone(),
            source,
        })
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}
