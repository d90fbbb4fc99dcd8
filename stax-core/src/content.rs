//! Content tree: ingestion and path resolution

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{ContentConfig, SiteConfig};
use crate::doc::Document;
use crate::error::DocsError;
use crate::slug::SlugPath;

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// Read access to a set of documents keyed by path
pub trait ContentSource {
    /// Exact, case-sensitive, segment-for-segment lookup
    fn resolve(&self, segments: &[String]) -> Result<&Document, DocsError>;

    /// Every path that resolves, in a stable order
    fn paths(&self) -> Box<dyn Iterator<Item = &SlugPath> + '_>;

    /// Identifies this snapshot of the content
    fn revision(&self) -> u64;
}

/// Immutable, fully ingested set of documents
#[derive(Debug)]
pub struct ContentTree {
    docs: BTreeMap<SlugPath, Document>,
    revision: u64,
}

impl ContentTree {
    /// Build a tree from documents; two documents on one path is an error
    pub fn new(docs: impl IntoIterator<Item = Document>) -> Result<Self> {
        let mut map: BTreeMap<SlugPath, Document> = BTreeMap::new();
        for doc in docs {
            if let Some(existing) = map.get(&doc.path) {
                bail!(
                    "Both {} and {} map to {}",
                    existing.source_file,
                    doc.source_file,
                    doc.path
                );
            }
            map.insert(doc.path.clone(), doc);
        }

        Ok(Self {
            docs: map,
            revision: NEXT_REVISION.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Ingest every page under the configured content directory
    pub fn load(content: &ContentConfig, site: &SiteConfig) -> Result<Self> {
        let root = &content.dir;
        if !root.is_dir() {
            bail!("Content directory not found: {}", root.display());
        }

        let mut files = Vec::new();
        collect_files(root, &content.extensions, &mut files)?;
        files.sort();

        let mut docs = Vec::with_capacity(files.len());
        for file in files {
            let relative = file
                .strip_prefix(root)
                .with_context(|| format!("File outside content root: {}", file.display()))?;
            let (path, source_file) = slug_for(relative)?;

            let fallback = if path.is_root() {
                site.title.clone()
            } else {
                path.last().unwrap_or_default().to_string()
            };

            let mut doc = Document::load(&file, path, &source_file, &fallback)?;
            if doc.path.is_root() {
                if let Some(root_title) = &site.root_title {
                    doc.metadata.title = root_title.clone();
                }
            }
            docs.push(doc);
        }

        let tree = Self::new(docs)?;
        log::info!(
            "Loaded {} documents from {} (revision {})",
            tree.len(),
            root.display(),
            tree.revision
        );
        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.docs.values()
    }

    pub fn get(&self, path: &SlugPath) -> Option<&Document> {
        self.docs.get(path)
    }
}

impl ContentSource for ContentTree {
    fn resolve(&self, segments: &[String]) -> Result<&Document, DocsError> {
        let path = SlugPath::new(segments.iter().cloned());
        match self.docs.get(&path) {
            Some(doc) => Ok(doc),
            None => Err(DocsError::NotFound(path)),
        }
    }

    fn paths(&self) -> Box<dyn Iterator<Item = &SlugPath> + '_> {
        Box::new(self.docs.keys())
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

fn collect_files(dir: &Path, extensions: &[String], out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }

        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        if file_type.is_dir() {
            collect_files(&path, extensions, out)?;
        } else if has_extension(&path, extensions) {
            out.push(path);
        }
    }

    Ok(())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed == ext))
}

/// Map a file relative to the content root to its slug path and display path
fn slug_for(relative: &Path) -> Result<(SlugPath, String)> {
    let mut segments = Vec::new();
    for component in relative.components() {
        let Some(segment) = component.as_os_str().to_str() else {
            bail!("Non UTF-8 path in content: {}", relative.display());
        };
        segments.push(segment.to_string());
    }

    let source_file = segments.join("/");
    let Some(file_name) = segments.pop() else {
        bail!("Empty content path");
    };
    let stem = Path::new(&file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&file_name)
        .to_string();

    if stem != "index" {
        segments.push(stem);
    }

    Ok((SlugPath::new(segments), source_file))
}
