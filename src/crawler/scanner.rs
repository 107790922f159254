//! Markup scanner for script locations
//!
//! The scanner walks the parsed document in document order and yields one
//! [`Candidate`] per non-empty attribute value at a configured extraction
//! point. Values that are not valid URLs are logged and skipped.

use crate::config::ExtractionPoints;
use crate::url::Candidate;
use crate::GetJsError;
use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};
use std::io::Read;

/// Parses a page body and returns a lazy sequence of candidates
///
/// The sequence is finite and cannot be restarted; scanning again means
/// calling `scan` again on the original bytes.
///
/// # Arguments
///
/// * `body` - Page markup; read to the end before parsing
/// * `points` - Tags and attributes to collect values from
///
/// # Returns
///
/// * `Ok(Candidates)` - Iterator over the candidates in document order
/// * `Err(GetJsError::Parse)` - The body could not be read
///
/// # Example
///
/// ```
/// use getjs::config::ExtractionPoints;
/// use getjs::crawler::scan;
///
/// let html = r#"<script src="/a.js"></script><script data-src="b.js"></script>"#;
/// let points = ExtractionPoints::default();
/// let found: Vec<String> = scan(html.as_bytes(), &points)
///     .unwrap()
///     .map(|c| c.into_string())
///     .collect();
/// assert_eq!(found, vec!["/a.js", "b.js"]);
/// ```
pub fn scan<R: Read>(mut body: R, points: &ExtractionPoints) -> Result<Candidates<'_>, GetJsError> {
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes)
        .map_err(|e| GetJsError::Parse(format!("failed to read body: {}", e)))?;

    let document = Html::parse_document(&String::from_utf8_lossy(&bytes));
    let cursor = Some(document.tree.root().id());

    Ok(Candidates {
        document,
        points,
        cursor,
        pending: Vec::new().into_iter(),
    })
}

/// Lazy iterator over the candidates of one document
pub struct Candidates<'p> {
    document: Html,
    points: &'p ExtractionPoints,
    /// Next node to visit, in document order
    cursor: Option<NodeId>,
    /// Attribute values of the element last visited
    pending: std::vec::IntoIter<String>,
}

impl Iterator for Candidates<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            if let Some(value) = self.pending.next() {
                match Candidate::parse(&value) {
                    Ok(candidate) => return Some(candidate),
                    Err(e) => {
                        tracing::debug!("{}", GetJsError::Extraction(e));
                        continue;
                    }
                }
            }

            let node = self.document.tree.get(self.cursor?)?;
            self.cursor = following(node);

            if let Node::Element(element) = node.value() {
                if let Some(attributes) = self.points.attributes(element.name()) {
                    self.pending = attributes
                        .iter()
                        .filter_map(|attribute| element.attr(attribute))
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                        .map(String::from)
                        .collect::<Vec<_>>()
                        .into_iter();
                }
            }
        }
    }
}

/// Next node after `node` in a pre-order walk of the tree
fn following(node: NodeRef<'_, Node>) -> Option<NodeId> {
    if let Some(child) = node.first_child() {
        return Some(child.id());
    }

    let mut current = node;
    loop {
        if let Some(sibling) = current.next_sibling() {
            return Some(sibling.id());
        }
        current = current.parent()?;
    }
}
