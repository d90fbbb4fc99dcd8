//! Front matter detection and parsing.

use anyhow::{Context, Result};
use ropey::Rope;
use serde::Deserialize;
use std::fmt;

/// Types of front matter markers recognized at the top of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontMatterKind {
    Yaml,
    Toml,
}

impl FrontMatterKind {
    fn as_str(&self) -> &'static str {
        match self {
            FrontMatterKind::Yaml => "yaml",
            FrontMatterKind::Toml => "toml",
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            FrontMatterKind::Yaml => "---",
            FrontMatterKind::Toml => "+++",
        }
    }
}

impl fmt::Display for FrontMatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Location of a detected front matter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter {
    pub kind: FrontMatterKind,
    pub start_line: usize,
    pub end_line: usize,
}

/// Page settings read from front matter. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageFrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    pub full: bool,
    pub toc: Option<bool>,
}

/// Detects front matter at the top of a document and returns its location.
pub fn detect_front_matter(rope: &Rope) -> Option<FrontMatter> {
    if rope.len_lines() == 0 {
        return None;
    }

    let first = normalize_line(&rope.line(0));
    let kind = [FrontMatterKind::Yaml, FrontMatterKind::Toml]
        .into_iter()
        .find(|kind| first == kind.marker())?;

    (1..rope.len_lines())
        .find(|&idx| normalize_line(&rope.line(idx)) == kind.marker())
        .map(|end_line| FrontMatter {
            kind,
            start_line: 0,
            end_line,
        })
}

/// Split a page into its parsed front matter and the remaining markdown source.
pub fn split_front_matter(rope: &Rope) -> Result<(PageFrontMatter, String)> {
    let Some(fm) = detect_front_matter(rope) else {
        return Ok((PageFrontMatter::default(), rope.to_string()));
    };

    let inner = rope
        .slice(rope.line_to_char(fm.start_line + 1)..rope.line_to_char(fm.end_line))
        .to_string();
    let body = rope.slice(rope.line_to_char(fm.end_line + 1)..).to_string();

    if inner.trim().is_empty() {
        return Ok((PageFrontMatter::default(), body));
    }

    let parsed: PageFrontMatter = match fm.kind {
        FrontMatterKind::Yaml => serde_yaml::from_str(&inner)
            .with_context(|| format!("Failed to parse {} front matter", fm.kind))?,
        FrontMatterKind::Toml => toml::from_str(&inner)
            .with_context(|| format!("Failed to parse {} front matter", fm.kind))?,
    };

    Ok((parsed, body))
}

fn normalize_line(line: &ropey::RopeSlice<'_>) -> String {
    let content: String = line.chunks().collect();
    content.trim().trim_start_matches('\u{feff}').to_string()
}
