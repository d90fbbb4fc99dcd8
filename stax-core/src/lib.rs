//! Stax Core - Content tree, markdown export, and route handlers
//!
//! This crate contains the docs logic, independent of the HTTP server:
//! - Content ingestion and path resolution
//! - Structured page bodies and TOC extraction
//! - Markdown export with an optional cache
//! - Page view / raw markdown / route listing handlers
//! - Configuration management

pub mod body;
pub mod cache;
pub mod config;
pub mod content;
pub mod copy;
pub mod doc;
pub mod error;
pub mod export;
pub mod front_matter;
pub mod links;
pub mod nav;
pub mod site;
pub mod slug;
pub mod toc;

// Re-export commonly used types
pub use config::Config;
pub use content::{ContentSource, ContentTree};
pub use doc::{Document, Heading, Metadata};
pub use error::DocsError;
pub use export::to_markdown;
pub use site::{PageMetadata, PageView, Route, Site};
pub use slug::SlugPath;
