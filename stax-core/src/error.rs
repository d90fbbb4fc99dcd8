//! Errors surfaced by the route handlers

use crate::slug::SlugPath;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocsError {
    /// No document lives at this path
    #[error("no document at {0}")]
    NotFound(SlugPath),

    /// The document body cannot be written back out as markdown
    #[error("document {path} cannot be exported: {reason}")]
    MalformedDocument { path: SlugPath, reason: String },
}

impl DocsError {
    pub fn malformed(path: &SlugPath, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T, E = DocsError> = std::result::Result<T, E>;
