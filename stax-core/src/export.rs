//! Document → markdown export.
//!
//! Produces the plain markdown used for "copy page" and the raw markdown
//! route. Raw HTML and JSX component markup are dropped; everything else is
//! written back as CommonMark/GFM. Output is a pure function of the document.

use crate::body::{plain_text, Alignment, Block, Inline};
use crate::doc::Document;
use crate::error::{DocsError, Result};
use crate::slug::SlugPath;

/// Render a document as markdown: title, description, then the body.
pub fn to_markdown(doc: &Document) -> Result<String> {
    let writer = MarkdownWriter { path: &doc.path };

    let mut sections = vec![format!("# {}", escape_text(doc.metadata.title.trim()))];
    if let Some(description) = &doc.metadata.description {
        sections.push(escape_line_starts(&escape_text(description.trim())));
    }

    let body = writer.blocks(without_title_heading(doc), "\n\n")?;
    if !body.is_empty() {
        sections.push(body);
    }

    let mut out = sections.join("\n\n");
    out.push('\n');
    Ok(out)
}

/// Body blocks, minus a leading H1 that repeats the title
fn without_title_heading(doc: &Document) -> &[Block] {
    let blocks = doc.body.blocks.as_slice();
    match blocks.first() {
        Some(Block::Heading { level: 1, content })
            if plain_text(content).trim() == doc.metadata.title.trim() =>
        {
            &blocks[1..]
        }
        _ => blocks,
    }
}

struct MarkdownWriter<'a> {
    path: &'a SlugPath,
}

impl MarkdownWriter<'_> {
    fn malformed(&self, reason: impl Into<String>) -> DocsError {
        DocsError::malformed(self.path, reason)
    }

    fn blocks(&self, blocks: &[Block], separator: &str) -> Result<String> {
        let mut rendered = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(text) = self.block(block)? {
                rendered.push(text);
            }
        }
        Ok(rendered.join(separator))
    }

    /// `None` for blocks that produce no text
    fn block(&self, block: &Block) -> Result<Option<String>> {
        let text = match block {
            Block::Heading { level, content } => {
                if !(1..=6).contains(level) {
                    return Err(self.malformed(format!("heading level {} out of range", level)));
                }
                let text = single_line(&inlines(content));
                format!("{} {}", "#".repeat(*level as usize), text.trim())
            }
            Block::Paragraph { content } => escape_line_starts(inlines(content).trim()),
            Block::CodeBlock { lang, code } => {
                let fence = "`".repeat(fence_length(code, '`'));
                let mut out = format!("{}{}\n", fence, lang.as_deref().unwrap_or(""));
                out.push_str(code);
                if !code.is_empty() && !code.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&fence);
                out
            }
            Block::List { start, tight, items } => {
                let mut rendered = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let marker = match start {
                        Some(n) => format!("{}. ", n + idx as u64),
                        None => "- ".to_string(),
                    };
                    let separator = if *tight { "\n" } else { "\n\n" };
                    let inner = self.blocks(&item.blocks, separator)?;
                    rendered.push(hang(&marker, &inner));
                }
                rendered.join(if *tight { "\n" } else { "\n\n" })
            }
            Block::BlockQuote { blocks } => {
                let inner = self.blocks(blocks, "\n\n")?;
                prefix_lines(&inner, "> ", ">")
            }
            Block::Table {
                alignments,
                header,
                rows,
            } => self.table(alignments, header, rows)?,
            Block::FootnoteDefinition { label, blocks } => {
                let inner = self.blocks(blocks, "\n\n")?;
                let marker = format!("[^{}]: ", label);
                let mut lines = inner.lines();
                let mut out = format!("{}{}", marker, lines.next().unwrap_or(""));
                for line in lines {
                    out.push('\n');
                    if !line.is_empty() {
                        out.push_str("    ");
                        out.push_str(line);
                    }
                }
                out
            }
            Block::Html { .. } => return Ok(None),
            Block::Rule => "---".to_string(),
        };

        Ok((!text.is_empty()).then_some(text))
    }

    fn table(
        &self,
        alignments: &[Alignment],
        header: &[Vec<Inline>],
        rows: &[Vec<Vec<Inline>>],
    ) -> Result<String> {
        if header.is_empty() {
            return Err(self.malformed("table without header cells"));
        }
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != header.len())
        {
            return Err(self.malformed(format!(
                "table row {} has {} cells, header has {}",
                idx + 1,
                row.len(),
                header.len()
            )));
        }

        let mut lines = Vec::with_capacity(rows.len() + 2);
        lines.push(table_row(header));
        let delimiter: Vec<&str> = (0..header.len())
            .map(|col| match alignments.get(col).copied().unwrap_or(Alignment::None) {
                Alignment::None => "---",
                Alignment::Left => ":---",
                Alignment::Center => ":---:",
                Alignment::Right => "---:",
            })
            .collect();
        lines.push(format!("| {} |", delimiter.join(" | ")));
        lines.extend(rows.iter().map(|row| table_row(row)));

        Ok(lines.join("\n"))
    }
}

fn table_row(cells: &[Vec<Inline>]) -> String {
    let cells: Vec<String> = cells
        .iter()
        .map(|cell| single_line(&inlines(cell)).trim().replace('|', "\\|"))
        .collect();
    format!("| {} |", cells.join(" | "))
}

fn inlines(content: &[Inline]) -> String {
    let mut out = String::new();
    for inline in content {
        write_inline(inline, &mut out);
    }
    out
}

fn write_inline(inline: &Inline, out: &mut String) {
    match inline {
        Inline::Text { text } => out.push_str(&escape_text(text)),
        Inline::Code { code } => {
            let ticks = "`".repeat(inline_code_ticks(code));
            let pad = code.starts_with('`') || code.ends_with('`');
            out.push_str(&ticks);
            if pad {
                out.push(' ');
            }
            out.push_str(code);
            if pad {
                out.push(' ');
            }
            out.push_str(&ticks);
        }
        Inline::Emphasis { content } => wrap(out, "*", content),
        Inline::Strong { content } => wrap(out, "**", content),
        Inline::Strikethrough { content } => wrap(out, "~~", content),
        Inline::Link {
            url,
            title,
            content,
        } => {
            let text = inlines(content);
            out.push('[');
            out.push_str(if text.is_empty() { url } else { &text });
            out.push_str("](");
            out.push_str(url);
            push_title(out, title);
            out.push(')');
        }
        Inline::Image { url, title, alt } => {
            out.push_str("![");
            out.push_str(&escape_text(&plain_text(alt)));
            out.push_str("](");
            out.push_str(url);
            push_title(out, title);
            out.push(')');
        }
        Inline::FootnoteReference { label } => {
            out.push_str("[^");
            out.push_str(label);
            out.push(']');
        }
        Inline::TaskMarker { checked } => out.push_str(if *checked { "[x] " } else { "[ ] " }),
        Inline::Html { .. } => {}
        Inline::SoftBreak => out.push('\n'),
        Inline::HardBreak => out.push_str("\\\n"),
    }
}

fn wrap(out: &mut String, marker: &str, content: &[Inline]) {
    let inner = inlines(content);
    if inner.is_empty() {
        return;
    }
    out.push_str(marker);
    out.push_str(&inner);
    out.push_str(marker);
}

fn push_title(out: &mut String, title: &str) {
    if !title.is_empty() {
        out.push_str(" \"");
        out.push_str(&title.replace('"', "\\\""));
        out.push('"');
    }
}

/// Escape characters that would otherwise start inline markup or HTML
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '~' | '<' | '>' | '&') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape paragraph lines that would reparse as a heading, quote, list or setext underline
fn escape_line_starts(paragraph: &str) -> String {
    paragraph
        .split('\n')
        .map(|line| {
            let indent = line.len() - line.trim_start().len();
            let (lead, rest) = line.split_at(indent);
            if rest.starts_with(&['#', '>', '-', '+', '='][..]) {
                return format!("{}\\{}", lead, rest);
            }
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 0 && rest[digits..].starts_with(&['.', ')'][..]) {
                return format!("{}{}\\{}", lead, &rest[..digits], &rest[digits..]);
            }
            line.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fence length (at least 3) longer than any run of `fence_char` in the content
fn fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

fn inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}

fn longest_run(content: &str, needle: char) -> usize {
    let mut max_run = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == needle {
            current += 1;
            max_run = max_run.max(current);
        } else {
            current = 0;
        }
    }
    max_run
}

fn single_line(text: &str) -> String {
    text.replace("\\\n", " ").replace('\n', " ")
}

/// First line after `marker`, following lines indented to line up with it
fn hang(marker: &str, text: &str) -> String {
    let indent = " ".repeat(marker.len());
    let mut lines = text.lines();
    let mut out = match lines.next() {
        Some(first) if !first.is_empty() => format!("{}{}", marker, first),
        _ => marker.trim_end().to_string(),
    };
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&indent);
            out.push_str(line);
        }
    }
    out
}

fn prefix_lines(text: &str, prefix: &str, empty_prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                empty_prefix.to_string()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Body, ListItem};
    use crate::doc::Metadata;

    fn doc_from(markdown: &str) -> Document {
        let mut metadata = Metadata::titled("Guide");
        metadata.description = Some("All about it".to_string());
        Document::new(SlugPath::new(["guide"]), metadata, Body::parse(markdown), "guide.md")
    }

    fn body_markdown(markdown: &str) -> String {
        let doc = Document::new(
            SlugPath::root(),
            Metadata::titled("T"),
            Body::parse(markdown),
            "index.md",
        );
        let out = to_markdown(&doc).expect("export should succeed");
        out.strip_prefix("# T\n\n")
            .map(str::to_string)
            .unwrap_or_default()
    }

    #[test]
    fn test_title_and_description_lead() {
        let out = to_markdown(&doc_from("Body text.\n")).unwrap();
        assert_eq!(out, "# Guide\n\nAll about it\n\nBody text.\n");
    }

    #[test]
    fn test_empty_body() {
        let doc = Document::new(SlugPath::root(), Metadata::titled("Home"), Body::default(), "index.md");
        assert_eq!(to_markdown(&doc).unwrap(), "# Home\n");
    }

    #[test]
    fn test_is_deterministic() {
        let doc = doc_from("# Intro\n\n- a\n- b\n\n| x | y |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(to_markdown(&doc).unwrap(), to_markdown(&doc).unwrap());
    }

    #[test]
    fn test_heading_order_and_nesting() {
        let doc = doc_from("# Intro\n\nHello.\n\n## Setup\n\nSteps.\n");
        assert_eq!(doc.toc[0].text, "Intro");
        assert_eq!(doc.toc[1].text, "Setup");

        let out = to_markdown(&doc).unwrap();
        let intro = out.find("\n# Intro\n").expect("intro heading");
        let setup = out.find("\n## Setup\n").expect("setup heading");
        assert!(intro < setup);
    }

    #[test]
    fn test_ui_markup_is_dropped() {
        let out = body_markdown(
            "<Callout type=\"info\">\n\nRead this.\n\n</Callout>\n\nA <kbd>key</kbd> press.\n",
        );
        assert_eq!(out, "Read this.\n\nA key press.\n");
        assert!(!out.contains('<'));
    }

    #[test]
    fn test_lists() {
        assert_eq!(body_markdown("- one\n- two\n  - nested\n"), "- one\n- two\n  - nested\n");
        assert_eq!(body_markdown("1. a\n\n2. b\n"), "1. a\n\n2. b\n");
        assert_eq!(body_markdown("- [x] done\n- [ ] todo\n"), "- [x] done\n- [ ] todo\n");
    }

    #[test]
    fn test_code_blocks() {
        assert_eq!(body_markdown("```rust\nfn main() {}\n```\n"), "```rust\nfn main() {}\n```\n");
        assert_eq!(
            body_markdown("````md\n```js\nx\n```\n````\n"),
            "````md\n```js\nx\n```\n````\n"
        );
        assert_eq!(body_markdown("Run `cargo test` now.\n"), "Run `cargo test` now.\n");
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(
            body_markdown("**bold** *em* ~~gone~~ [link](/docs \"Docs\") ![alt](a.png)\n"),
            "**bold** *em* ~~gone~~ [link](/docs \"Docs\") ![alt](a.png)\n"
        );
        assert_eq!(body_markdown("a\\*b\n"), "a\\*b\n");
    }

    #[test]
    fn test_blockquote_and_table() {
        assert_eq!(body_markdown("> one\n>\n> two\n"), "> one\n>\n> two\n");
        assert_eq!(
            body_markdown("| A | B |\n|:-:|--:|\n| 1 | 2 |\n"),
            "| A | B |\n| :---: | ---: |\n| 1 | 2 |\n"
        );
    }

    #[test]
    fn test_bad_heading_level_is_malformed() {
        let body = Body {
            blocks: vec![Block::Heading {
                level: 9,
                content: vec![Inline::text("Deep")],
            }],
        };
        let doc = Document::new(SlugPath::new(["bad"]), Metadata::titled("Bad"), body, "bad.md");
        let err = to_markdown(&doc).unwrap_err();
        assert!(matches!(err, DocsError::MalformedDocument { ref path, .. } if *path == SlugPath::new(["bad"])));
    }

    #[test]
    fn test_ragged_table_is_malformed() {
        let body = Body {
            blocks: vec![Block::List {
                start: None,
                tight: true,
                items: vec![ListItem {
                    blocks: vec![Block::Table {
                        alignments: vec![Alignment::None],
                        header: vec![vec![Inline::text("A")]],
                        rows: vec![vec![vec![Inline::text("1")], vec![Inline::text("2")]]],
                    }],
                }],
            }],
        };
        let doc = Document::new(SlugPath::root(), Metadata::titled("T"), body, "index.md");
        assert!(matches!(
            to_markdown(&doc),
            Err(DocsError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_title_heading_is_not_repeated() -> anyhow::Result<()> {
        let doc = Document::parse(SlugPath::new(["deploy"]), "deploy.md", "# Deploy\n\nShip it.\n", "deploy")?;
        assert_eq!(to_markdown(&doc)?, "# Deploy\n\nShip it.\n");

        let doc = Document::parse(
            SlugPath::new(["guide"]),
            "guide.md",
            "---\ntitle: Guide\n---\n# Intro\n",
            "guide",
        )?;
        assert_eq!(to_markdown(&doc)?, "# Guide\n\n# Intro\n");
        Ok(())
    }

    #[test]
    fn test_literal_markup_characters_survive_reparse() {
        let source = "\\# not a heading\n\n1986\\. a year\n\n\\_lit\\_ and &lt;Button&gt;\n\n\\- not a list\n";
        let out = body_markdown(source);
        assert_eq!(
            out,
            "\\# not a heading\n\n1986\\. a year\n\n\\_lit\\_ and \\<Button\\>\n\n\\- not a list\n"
        );
        assert_eq!(Body::parse(&out), Body::parse(source));
    }
}
