use super::Candidate;
use url::Url;

/// Rewrites a relative candidate into an absolute URL using the page it came from
///
/// | Candidate            | Result                                   |
/// |----------------------|------------------------------------------|
/// | absolute             | unchanged                                |
/// | `//host/path`        | `<base scheme>:` + candidate             |
/// | `/path`              | `<base scheme>://<base host>` + candidate |
/// | `path`               | scheme, host and base path, joined by `/` |
///
/// A trailing `/` on the base path is dropped before joining so directory
/// pages do not produce `//` in the result.
///
/// # Arguments
///
/// * `candidate` - Location found in the page markup
/// * `base` - URL of the page the candidate was found on
///
/// # Returns
///
/// The candidate in absolute form, flagged as absolute
///
/// # Examples
///
/// ```
/// use getjs::url::{complete, Candidate};
/// use url::Url;
///
/// let base = Url::parse("https://y.com/p/q").unwrap();
/// let done = complete(Candidate::parse("a.js").unwrap(), &base);
/// assert_eq!(done.as_str(), "https://y.com/p/q/a.js");
/// ```
pub fn complete(candidate: Candidate, base: &Url) -> Candidate {
    if candidate.is_absolute() {
        return candidate;
    }

    let value = candidate.as_str();
    let completed = if value.starts_with("//") {
        format!("{}:{}", base.scheme(), value)
    } else if value.starts_with('/') {
        format!("{}{}", origin(base), value)
    } else {
        format!(
            "{}{}/{}",
            origin(base),
            base.path().trim_end_matches('/'),
            value
        )
    };

    Candidate::absolute(completed)
}

/// `scheme://host[:port]` of the base URL
fn origin(base: &Url) -> String {
    let host = base.host_str().unwrap_or_default();
    match base.port() {
        Some(port) => format!("{}://{}:{}", base.scheme(), host, port),
        None => format!("{}://{}", base.scheme(), host),
    }
}
