//! Table of Contents extraction from the page body

use crate::body::{plain_text, Block, Body};
use crate::doc::Heading;
use crate::slug::make_anchor;
use std::collections::HashMap;

/// Collect top-level headings in document order.
///
/// Repeated anchors get a numeric suffix (`setup`, `setup-1`, ...).
pub fn extract_headings(body: &Body) -> Vec<Heading> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headings = Vec::new();

    for block in &body.blocks {
        let Block::Heading { level, content } = block else {
            continue;
        };

        let text = plain_text(content).trim().to_string();
        let base = make_anchor(&text);
        let count = seen.entry(base.clone()).or_insert(0);
        let anchor = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;

        headings.push(Heading {
            level: *level,
            text,
            anchor,
        });
    }

    headings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_headings_empty() {
        let headings = extract_headings(&Body::parse(""));
        assert_eq!(headings.len(), 0);
    }

    #[test]
    fn test_headings_in_document_order() {
        let body = Body::parse("## Zeta\n\ntext\n\n# Alpha\n\n### `code` Beta\n");
        let headings = extract_headings(&body);

        assert_eq!(headings.len(), 3);
        assert_eq!(headings[0].level, 2);
        assert_eq!(headings[0].text, "Zeta");
        assert_eq!(headings[1].level, 1);
        assert_eq!(headings[1].text, "Alpha");
        assert_eq!(headings[2].level, 3);
        assert_eq!(headings[2].text, "code Beta");
        assert_eq!(headings[2].anchor, "code-beta");
    }

    #[test]
    fn test_setext_headings() {
        let body = Body::parse("Heading 1\n=========\n\nHeading 2\n---------\n");
        let headings = extract_headings(&body);

        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].text, "Heading 2");
    }

    #[test]
    fn test_code_fence_hashes_are_not_headings() {
        let body = Body::parse("```sh\n# not a heading\n```\n");
        assert!(extract_headings(&body).is_empty());
    }

    #[test]
    fn test_duplicate_anchors_are_suffixed() {
        let body = Body::parse("## Setup\n\n## Setup\n\n## Setup\n");
        let anchors: Vec<_> = extract_headings(&body)
            .into_iter()
            .map(|h| h.anchor)
            .collect();
        assert_eq!(anchors, vec!["setup", "setup-1", "setup-2"]);
    }
}
