//! Slug paths and heading anchors

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a document in the content tree, one entry per URL segment.
///
/// The empty path is the root index document.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlugPath(Vec<String>);

impl SlugPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Split a URL tail such as `guide/setup` into segments.
    ///
    /// Empty segments (leading, trailing or doubled slashes) are dropped.
    pub fn from_url(tail: &str) -> Self {
        Self::new(tail.split('/').filter(|s| !s.is_empty()))
    }

    /// Parse a still percent-encoded request path tail, one segment per `/`.
    ///
    /// `None` for empty segments, invalid UTF-8, or an encoded `/` inside a segment.
    pub fn from_encoded(tail: &str) -> Option<Self> {
        let tail = tail.strip_prefix('/').unwrap_or(tail);
        let mut segments = Vec::new();
        for raw in tail.split('/') {
            let segment = percent_decode_str(raw).decode_utf8().ok()?;
            if segment.is_empty() || segment.contains('/') {
                return None;
            }
            segments.push(segment.into_owned());
        }
        Some(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn join(&self, segment: impl Into<String>) -> SlugPath {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn starts_with(&self, prefix: &SlugPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// URL under the given prefix, e.g. `/docs/guide/setup`
    pub fn url(&self, prefix: &str) -> String {
        let prefix = prefix.trim_end_matches('/');
        if self.0.is_empty() {
            if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            }
        } else {
            format!("{}/{}", prefix, self.0.join("/"))
        }
    }
}

impl fmt::Display for SlugPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

impl From<Vec<String>> for SlugPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<SlugPath> for Vec<String> {
    fn from(path: SlugPath) -> Self {
        path.0
    }
}

/// Create an anchor from heading text
pub fn make_anchor(text: &str) -> String {
    let mut anchor = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            anchor.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' {
            anchor.push('-');
        } else if c == '_' {
            anchor.push('_');
        }
    }
    anchor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_drops_empty_segments() {
        assert_eq!(SlugPath::from_url("guide/setup"), SlugPath::new(["guide", "setup"]));
        assert_eq!(SlugPath::from_url("/guide//setup/"), SlugPath::new(["guide", "setup"]));
        assert!(SlugPath::from_url("").is_root());
    }

    #[test]
    fn test_from_encoded_is_segment_for_segment() {
        assert_eq!(SlugPath::from_encoded("guide/setup"), Some(SlugPath::new(["guide", "setup"])));
        assert_eq!(SlugPath::from_encoded("/guide"), Some(SlugPath::new(["guide"])));
        assert_eq!(SlugPath::from_encoded("gu%69de"), Some(SlugPath::new(["guide"])));
        assert_eq!(SlugPath::from_encoded("my%20page"), Some(SlugPath::new(["my page"])));
        assert_eq!(SlugPath::from_encoded("guide//setup"), None);
        assert_eq!(SlugPath::from_encoded("guide/"), None);
        assert_eq!(SlugPath::from_encoded(""), None);
        assert_eq!(SlugPath::from_encoded("guide%2Fsetup"), None);
        assert_eq!(SlugPath::from_encoded("%FF"), None);
    }

    #[test]
    fn test_url_and_display() {
        let path = SlugPath::new(["guide", "setup"]);
        assert_eq!(path.url("/docs"), "/docs/guide/setup");
        assert_eq!(path.url("/docs/"), "/docs/guide/setup");
        assert_eq!(SlugPath::root().url("/docs"), "/docs");
        assert_eq!(SlugPath::root().url(""), "/");
        assert_eq!(path.to_string(), "/guide/setup");
        assert_eq!(SlugPath::root().to_string(), "/");
    }

    #[test]
    fn test_join_and_starts_with() {
        let path = SlugPath::new(["a", "b"]);
        assert_eq!(SlugPath::root().join("a").join("b"), path);
        assert!(path.starts_with(&SlugPath::new(["a"])));
        assert!(path.starts_with(&SlugPath::root()));
    }

    #[test]
    fn test_ordering_is_segment_wise() {
        let mut paths = vec![
            SlugPath::new(["b"]),
            SlugPath::new(["a", "z"]),
            SlugPath::root(),
            SlugPath::new(["a"]),
        ];
        paths.sort();
        assert_eq!(
            paths,
            vec![
                SlugPath::root(),
                SlugPath::new(["a"]),
                SlugPath::new(["a", "z"]),
                SlugPath::new(["b"]),
            ]
        );
    }

    #[test]
    fn test_anchor_generation() {
        assert_eq!(make_anchor("Hello World"), "hello-world");
        assert_eq!(make_anchor("Test & Demo"), "test--demo");
        assert_eq!(make_anchor("snake_case api"), "snake_case-api");
        assert_eq!(make_anchor("  Setup  "), "setup");
    }
}
