//! Document model for a single docs page

use anyhow::{Context, Result};
use ropey::Rope;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::body::{plain_text, Block, Body};
use crate::front_matter::split_front_matter;
use crate::slug::SlugPath;
use crate::toc;

/// A heading in the table of contents
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub anchor: String,
}

/// Page metadata used for the page head and layout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub description: Option<String>,
    /// Layout hint: render the page at full width
    pub full: bool,
    /// Whether the page shows its table of contents
    pub toc: bool,
}

impl Metadata {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            full: false,
            toc: true,
        }
    }
}

/// A resolved docs page
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Document {
    pub path: SlugPath,
    pub metadata: Metadata,
    pub body: Body,
    pub toc: Vec<Heading>,
    /// Originating file relative to the content root, e.g. `guide/setup.mdx`
    pub source_file: String,
}

impl Document {
    pub fn new(path: SlugPath, metadata: Metadata, body: Body, source_file: impl Into<String>) -> Self {
        let toc = toc::extract_headings(&body);
        Self {
            path,
            metadata,
            body,
            toc,
            source_file: source_file.into(),
        }
    }

    /// Build a document from page source.
    ///
    /// The title comes from front matter, then the first level-1 heading, then `fallback_title`.
    pub fn parse(
        path: SlugPath,
        source_file: impl Into<String>,
        source: &str,
        fallback_title: &str,
    ) -> Result<Self> {
        let source_file = source_file.into();
        let rope = Rope::from_str(source);
        let (front_matter, markdown) = split_front_matter(&rope)
            .with_context(|| format!("Invalid front matter in {}", source_file))?;

        let markdown = if source_file.ends_with(".mdx") {
            strip_module_lines(&markdown)
        } else {
            markdown
        };

        let body = Body::parse(&markdown);

        let title = front_matter
            .title
            .or_else(|| first_title(&body))
            .unwrap_or_else(|| fallback_title.to_string());

        let metadata = Metadata {
            title,
            description: front_matter.description.filter(|d| !d.trim().is_empty()),
            full: front_matter.full,
            toc: front_matter.toc.unwrap_or(true),
        };

        Ok(Self::new(path, metadata, body, source_file))
    }

    /// Load a document from a file path
    pub fn load(file: &Path, path: SlugPath, source_file: &str, fallback_title: &str) -> Result<Self> {
        let content = fs::read_to_string(file)
            .with_context(|| format!("Failed to read file: {}", file.display()))?;
        Self::parse(path, source_file, &content, fallback_title)
    }

    /// Table of contents as shown on the page
    pub fn visible_toc(&self) -> &[Heading] {
        if self.metadata.toc {
            &self.toc
        } else {
            &[]
        }
    }
}

fn first_title(body: &Body) -> Option<String> {
    body.blocks.iter().find_map(|block| match block {
        Block::Heading { level: 1, content } => {
            let text = plain_text(content).trim().to_string();
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    })
}

/// Drop top-level MDX `import`/`export` statements, leaving fenced code untouched.
///
/// A statement runs until its brackets balance; a blank line always ends it.
fn strip_module_lines(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut fence: Option<&str> = None;
    let mut open_brackets: Option<i32> = None;

    for line in markdown.split_inclusive('\n') {
        if let Some(depth) = open_brackets {
            if line.trim().is_empty() {
                open_brackets = None;
            } else {
                let depth = depth + bracket_delta(line);
                open_brackets = (depth > 0).then_some(depth);
                continue;
            }
        }

        let trimmed = line.trim_start();
        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
        } else if trimmed.starts_with("```") {
            fence = Some("```");
        } else if trimmed.starts_with("~~~") {
            fence = Some("~~~");
        } else if ["import ", "import{", "export "]
            .iter()
            .any(|keyword| line.starts_with(keyword))
        {
            let depth = bracket_delta(line);
            open_brackets = (depth > 0).then_some(depth);
            continue;
        }
        out.push_str(line);
    }

    out
}

fn bracket_delta(line: &str) -> i32 {
    line.chars()
        .map(|c| match c {
            '{' | '(' | '[' => 1,
            '}' | ')' | ']' => -1,
            _ => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_front_matter_metadata() -> Result<()> {
        let doc = Document::parse(
            SlugPath::new(["guide"]),
            "guide.md",
            "---\ntitle: Guide\ndescription: How to\nfull: true\n---\n\n## Step\n",
            "guide",
        )?;
        assert_eq!(doc.metadata.title, "Guide");
        assert_eq!(doc.metadata.description.as_deref(), Some("How to"));
        assert!(doc.metadata.full);
        assert!(doc.metadata.toc);
        assert_eq!(doc.toc.len(), 1);
        assert_eq!(doc.toc[0].text, "Step");
        Ok(())
    }

    #[test]
    fn test_title_falls_back_to_heading_then_segment() -> Result<()> {
        let doc = Document::parse(SlugPath::new(["a"]), "a.md", "# From Heading\n", "a")?;
        assert_eq!(doc.metadata.title, "From Heading");

        let doc = Document::parse(SlugPath::new(["a"]), "a.md", "Just text\n", "a")?;
        assert_eq!(doc.metadata.title, "a");
        Ok(())
    }

    #[test]
    fn test_blank_description_is_none() -> Result<()> {
        let doc = Document::parse(SlugPath::root(), "index.md", "---\ndescription: \"  \"\n---\n", "Home")?;
        assert_eq!(doc.metadata.description, None);
        assert_eq!(doc.metadata.title, "Home");
        Ok(())
    }

    #[test]
    fn test_toc_disabled_hides_visible_toc() -> Result<()> {
        let doc = Document::parse(SlugPath::root(), "index.md", "---\ntoc: false\n---\n## A\n", "Home")?;
        assert_eq!(doc.toc.len(), 1);
        assert!(doc.visible_toc().is_empty());
        Ok(())
    }

    #[test]
    fn test_mdx_module_lines_are_removed() -> Result<()> {
        let source = "import { Tabs } from 'fumadocs-ui/components/tabs';\nexport const x = 1;\n\nText\n\n```js\nimport a from 'b';\n```\n";
        let doc = Document::parse(SlugPath::root(), "index.mdx", source, "Home")?;
        assert_eq!(doc.body.blocks.len(), 2);
        assert!(matches!(
            &doc.body.blocks[1],
            Block::CodeBlock { code, .. } if code == "import a from 'b';\n"
        ));
        Ok(())
    }

    #[test]
    fn test_multi_line_module_statements_are_removed() -> Result<()> {
        let source = "import {\n  Tab,\n  Tabs,\n} from 'fumadocs-ui/components/tabs';\nexport const meta = {\n  title: 'x',\n};\n\nBody.\n";
        let doc = Document::parse(SlugPath::root(), "index.mdx", source, "Home")?;
        assert_eq!(
            doc.body.blocks,
            vec![Block::Paragraph {
                content: vec![crate::body::Inline::text("Body.")],
            }]
        );
        Ok(())
    }

    #[test]
    fn test_blank_line_ends_unbalanced_statement() -> Result<()> {
        let doc = Document::parse(SlugPath::root(), "index.mdx", "export function f() {\n\nText\n", "Home")?;
        assert_eq!(doc.body.blocks.len(), 1);
        Ok(())
    }

    #[test]
    fn test_markdown_keeps_module_lines() -> Result<()> {
        let doc = Document::parse(SlugPath::root(), "index.md", "import this\n", "Home")?;
        assert_eq!(doc.body.blocks.len(), 1);
        Ok(())
    }

    #[test]
    fn test_load_simple_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"# Heading\n\nSome text\n")?;

        let doc = Document::load(file.path(), SlugPath::new(["x"]), "x.md", "x")?;
        assert_eq!(doc.metadata.title, "Heading");
        assert_eq!(doc.toc.len(), 1);
        assert_eq!(doc.toc[0].level, 1);
        assert_eq!(doc.source_file, "x.md");

        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let result = Document::load(Path::new("/nonexistent/page.md"), SlugPath::root(), "page.md", "x");
        assert!(result.is_err());
    }
}
