//! Route handlers: page view, raw markdown export, and route listing.
//!
//! These are plain functions over a snapshot of the content tree; the HTTP
//! server and the CLI are thin adapters around them.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;

use crate::body::Body;
use crate::cache::{ExportCache, ExportKey};
use crate::config::Config;
use crate::content::{ContentSource, ContentTree};
use crate::doc::{Document, Heading};
use crate::error::Result;
use crate::export::to_markdown;
use crate::links::{LinkBuilder, PageLinks};
use crate::nav::{build_navigation, NavNode};
use crate::slug::SlugPath;

/// Head metadata for a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: Option<String>,
}

/// Everything the presentation layer needs to render one page
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub path: SlugPath,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub full: bool,
    pub toc: Vec<Heading>,
    pub body: Body,
    pub markdown: Arc<str>,
    pub source_file: String,
    pub links: PageLinks,
}

/// One statically generated route
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    pub slug: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SiteOptions {
    pub docs_prefix: String,
    pub cache_capacity: usize,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            docs_prefix: "/docs".to_string(),
            cache_capacity: 256,
        }
    }
}

impl From<&Config> for SiteOptions {
    fn from(config: &Config) -> Self {
        Self {
            docs_prefix: config.server.docs_prefix.clone(),
            cache_capacity: config.cache.effective_capacity(),
        }
    }
}

/// The docs site: current content tree plus the export cache
pub struct Site {
    tree: ArcSwap<ContentTree>,
    cache: ExportCache,
    links: LinkBuilder,
    docs_prefix: String,
}

impl Site {
    pub fn new(tree: ContentTree, links: LinkBuilder, options: SiteOptions) -> Self {
        Self {
            tree: ArcSwap::from_pointee(tree),
            cache: ExportCache::new(options.cache_capacity),
            links,
            docs_prefix: options.docs_prefix,
        }
    }

    /// Ingest content and build the site from a loaded config
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let tree = ContentTree::load(&config.content, &config.site)?;
        Ok(Self::new(
            tree,
            LinkBuilder::new(config.repository.clone()),
            SiteOptions::from(config),
        ))
    }

    /// Current snapshot of the content tree
    pub fn tree(&self) -> Arc<ContentTree> {
        self.tree.load_full()
    }

    /// Swap in a freshly ingested tree and drop cached exports
    pub fn replace_tree(&self, tree: ContentTree) {
        log::info!(
            "Replacing content tree (revision {} -> {})",
            self.tree.load().revision(),
            tree.revision()
        );
        self.tree.store(Arc::new(tree));
        self.cache.clear();
    }

    fn export(&self, tree: &ContentTree, doc: &Document) -> Result<Arc<str>> {
        let key = ExportKey {
            revision: tree.revision(),
            path: doc.path.clone(),
        };
        self.cache.get_or_try_insert(key, || to_markdown(doc))
    }

    /// Page view: resolve, export eagerly, then assemble the view
    pub fn page(&self, segments: &[String]) -> Result<PageView> {
        let tree = self.tree();
        let doc = tree.resolve(segments)?;
        log::debug!("Resolved {} to {}", doc.path, doc.source_file);

        let markdown = self.export(&tree, doc)?;

        Ok(PageView {
            path: doc.path.clone(),
            url: doc.path.url(&self.docs_prefix),
            title: doc.metadata.title.clone(),
            description: doc.metadata.description.clone(),
            full: doc.metadata.full,
            toc: doc.visible_toc().to_vec(),
            body: doc.body.clone(),
            markdown,
            source_file: doc.source_file.clone(),
            links: self.links.for_document(doc),
        })
    }

    pub fn metadata(&self, segments: &[String]) -> Result<PageMetadata> {
        let tree = self.tree();
        let doc = tree.resolve(segments)?;
        Ok(PageMetadata {
            title: doc.metadata.title.clone(),
            description: doc.metadata.description.clone(),
        })
    }

    /// Raw markdown export, nothing else
    pub fn raw_markdown(&self, segments: &[String]) -> Result<Arc<str>> {
        let tree = self.tree();
        let doc = tree.resolve(segments)?;
        self.export(&tree, doc)
    }

    /// Every resolvable path, for static generation
    pub fn list_all_routes(&self) -> Vec<Route> {
        let tree = self.tree();
        tree.paths()
            .map(|path| Route {
                slug: path.segments().to_vec(),
            })
            .collect()
    }

    pub fn navigation(&self) -> Vec<NavNode> {
        build_navigation(&self.tree(), &self.docs_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Block, Inline};
    use crate::config::RepositoryConfig;
    use crate::doc::Metadata;
    use crate::error::DocsError;
    use anyhow::Result;

    fn doc(segments: &[&str], markdown: &str) -> Document {
        let path = SlugPath::new(segments.iter().copied());
        let title = path.last().unwrap_or("Home").to_string();
        Document::new(
            path,
            Metadata::titled(title),
            Body::parse(markdown),
            format!("{}.mdx", segments.join("/")),
        )
    }

    fn site_with(docs: Vec<Document>) -> Result<Site> {
        Ok(Site::new(
            ContentTree::new(docs)?,
            LinkBuilder::new(RepositoryConfig::default()),
            SiteOptions::default(),
        ))
    }

    fn segs(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_routes_match_resolvable_paths() -> Result<()> {
        let site = site_with(vec![
            doc(&[], "Hi"),
            doc(&["guide"], "# Intro"),
            doc(&["guide", "setup"], "Steps"),
        ])?;

        let routes = site.list_all_routes();
        assert_eq!(routes.len(), 3);
        for route in &routes {
            let view = site.page(&route.slug)?;
            assert_eq!(view.path.segments(), route.slug.as_slice());
        }
        assert_eq!(routes, site.list_all_routes());
        Ok(())
    }

    #[test]
    fn test_not_found_is_not_found() -> Result<()> {
        let site = site_with(vec![doc(&[], "Hi")])?;
        let missing = segs(&["nonexistent-page"]);
        assert!(site.page(&missing).unwrap_err().is_not_found());
        assert!(site.raw_markdown(&missing).unwrap_err().is_not_found());
        assert!(site.metadata(&missing).unwrap_err().is_not_found());
        Ok(())
    }

    #[test]
    fn test_page_view_carries_export_and_links() -> Result<()> {
        let site = site_with(vec![doc(&["guide"], "## Setup\n\nRun it.\n")])?;
        let view = site.page(&segs(&["guide"]))?;

        assert_eq!(view.url, "/docs/guide");
        assert_eq!(view.title, "guide");
        assert_eq!(view.toc.len(), 1);
        assert_eq!(&*view.markdown, "# guide\n\n## Setup\n\nRun it.\n");
        assert_eq!(view.markdown, site.raw_markdown(&segs(&["guide"]))?);
        assert!(view.links.edit.ends_with("/content/docs/guide.mdx"));
        assert!(view.links.issue.contains("guide.mdx"));
        Ok(())
    }

    #[test]
    fn test_raw_markdown_equals_export() -> Result<()> {
        let site = site_with(vec![doc(&[], "# Intro\n\n## Setup\n")])?;
        let tree = site.tree();
        let expected = to_markdown(tree.resolve(&[])?)?;
        assert_eq!(&*site.raw_markdown(&[])?, expected.as_str());
        Ok(())
    }

    #[test]
    fn test_replace_tree_invalidates_exports() -> Result<()> {
        let site = site_with(vec![doc(&[], "Old text")])?;
        assert!(site.raw_markdown(&[])?.contains("Old text"));

        site.replace_tree(ContentTree::new(vec![doc(&[], "New text")])?);
        let fresh = site.raw_markdown(&[])?;
        assert!(fresh.contains("New text"));
        assert!(!fresh.contains("Old text"));
        Ok(())
    }

    #[test]
    fn test_malformed_document_surfaces_as_error() -> Result<()> {
        let bad = Document::new(
            SlugPath::new(["bad"]),
            Metadata::titled("Bad"),
            Body {
                blocks: vec![Block::Heading {
                    level: 0,
                    content: vec![Inline::text("x")],
                }],
            },
            "bad.md",
        );
        let site = site_with(vec![bad])?;
        let err = site.page(&segs(&["bad"])).unwrap_err();
        assert!(matches!(err, DocsError::MalformedDocument { .. }));
        assert!(site.raw_markdown(&segs(&["bad"])).is_err());
        Ok(())
    }

    #[test]
    fn test_toc_hidden_when_disabled() -> Result<()> {
        let mut hidden = doc(&["x"], "## A\n");
        hidden.metadata.toc = false;
        let site = site_with(vec![hidden])?;
        assert!(site.page(&segs(&["x"]))?.toc.is_empty());
        Ok(())
    }
}
