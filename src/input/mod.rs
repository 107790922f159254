//! Work items and input detection
//!
//! Input is either a list of page URLs, one per line, or a single raw page
//! body (for example a saved HTTP response piped on stdin). The format is
//! detected from the first non-empty line.

use crate::url::parse_page_url;
use crate::GetJsError;
use std::fmt;
use std::io::BufRead;
use url::Url;

/// One unit of top-level input, consumed exactly once by the runner
#[derive(Clone, PartialEq, Eq)]
pub enum WorkItem {
    /// A page to fetch
    PageUrl(Url),

    /// Markup that is already in hand
    RawBody {
        /// The markup bytes
        body: Vec<u8>,
        /// Page the body came from, if known
        base: Option<Url>,
    },
}

impl WorkItem {
    /// Short description used in log messages
    pub fn label(&self) -> String {
        match self {
            Self::PageUrl(url) => url.to_string(),
            Self::RawBody { base: Some(base), .. } => format!("raw body ({})", base),
            Self::RawBody { base: None, .. } => "raw body".to_string(),
        }
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageUrl(url) => f.debug_tuple("PageUrl").field(&url.as_str()).finish(),
            Self::RawBody { body, base } => f
                .debug_struct("RawBody")
                .field("len", &body.len())
                .field("base", &base.as_ref().map(Url::as_str))
                .finish(),
        }
    }
}

/// Reads work items from a reader, detecting the input format
///
/// If the first non-empty line is an http(s) URL, every non-empty line is
/// treated as a page URL and lines that do not parse are logged and skipped.
/// Otherwise the whole input becomes one [`WorkItem::RawBody`] with `base`
/// as its page URL.
///
/// # Arguments
///
/// * `reader` - Source of the input, read to the end
/// * `base` - Page URL attached to a raw body, used for completion
///
/// # Returns
///
/// * `Ok(Vec<WorkItem>)` - Detected work items, possibly empty
/// * `Err(GetJsError::Io)` - The reader failed
///
/// # Example
///
/// ```
/// use getjs::input::{read_work_items, WorkItem};
///
/// let items = read_work_items("https://a.com/\n\nhttps://b.com/\n".as_bytes(), None).unwrap();
/// assert_eq!(items.len(), 2);
///
/// let items = read_work_items("<script src=/x.js></script>".as_bytes(), None).unwrap();
/// assert!(matches!(items[0], WorkItem::RawBody { .. }));
/// ```
pub fn read_work_items<R: BufRead>(
    mut reader: R,
    base: Option<&Url>,
) -> Result<Vec<WorkItem>, GetJsError> {
    let mut content = Vec::new();
    reader.read_to_end(&mut content)?;
    Ok(parse_work_items(&content, base))
}

/// Detects the input format of an in-memory buffer; see [`read_work_items`]
pub fn parse_work_items(content: &[u8], base: Option<&Url>) -> Vec<WorkItem> {
    let text = String::from_utf8_lossy(content);

    let first_line = text.lines().map(str::trim).find(|line| !line.is_empty());
    let Some(first_line) = first_line else {
        return Vec::new();
    };

    if parse_page_url(first_line).is_err() {
        tracing::debug!("Input is not a URL list, treating it as a raw response body");
        return vec![WorkItem::RawBody {
            body: content.to_vec(),
            base: base.cloned(),
        }];
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parse_page_url(line) {
            Ok(url) => Some(WorkItem::PageUrl(url)),
            Err(source) => {
                let err = GetJsError::Input {
                    line: line.to_string(),
                    source,
                };
                tracing::warn!("Skipping input: {}", err);
                None
            }
        })
        .collect()
}
