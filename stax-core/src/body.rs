//! Structured page body built from markdown events

use pulldown_cmark::{Alignment as CmarkAlignment, CodeBlockKind, Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};
use std::iter::Peekable;

/// The renderable content of a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    Paragraph {
        content: Vec<Inline>,
    },
    CodeBlock {
        lang: Option<String>,
        code: String,
    },
    List {
        start: Option<u64>,
        tight: bool,
        items: Vec<ListItem>,
    },
    BlockQuote {
        blocks: Vec<Block>,
    },
    Table {
        alignments: Vec<Alignment>,
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    FootnoteDefinition {
        label: String,
        blocks: Vec<Block>,
    },
    /// Raw HTML or JSX component markup
    Html {
        html: String,
    },
    Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text {
        text: String,
    },
    Code {
        code: String,
    },
    Emphasis {
        content: Vec<Inline>,
    },
    Strong {
        content: Vec<Inline>,
    },
    Strikethrough {
        content: Vec<Inline>,
    },
    Link {
        url: String,
        title: String,
        content: Vec<Inline>,
    },
    Image {
        url: String,
        title: String,
        alt: Vec<Inline>,
    },
    FootnoteReference {
        label: String,
    },
    TaskMarker {
        checked: bool,
    },
    Html {
        html: String,
    },
    SoftBreak,
    HardBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }
}

impl Body {
    /// Parse markdown source into a block tree
    pub fn parse(source: &str) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);

        let mut events = Parser::new_ext(source, options).peekable();
        let blocks = parse_blocks(&mut events);
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Flatten inline content to plain text
pub fn plain_text(content: &[Inline]) -> String {
    let mut out = String::new();
    collect_text(content, &mut out);
    out
}

fn collect_text(content: &[Inline], out: &mut String) {
    for inline in content {
        match inline {
            Inline::Text { text } => out.push_str(text),
            Inline::Code { code } => out.push_str(code),
            Inline::Emphasis { content }
            | Inline::Strong { content }
            | Inline::Strikethrough { content }
            | Inline::Link { content, .. } => collect_text(content, out),
            Inline::Image { alt, .. } => collect_text(alt, out),
            Inline::SoftBreak | Inline::HardBreak => out.push(' '),
            Inline::FootnoteReference { .. }
            | Inline::TaskMarker { .. }
            | Inline::Html { .. } => {}
        }
    }
}

fn is_inline(event: &Event<'_>) -> bool {
    match event {
        Event::Text(_)
        | Event::Code(_)
        | Event::InlineMath(_)
        | Event::InlineHtml(_)
        | Event::SoftBreak
        | Event::HardBreak
        | Event::FootnoteReference(_)
        | Event::TaskListMarker(_) => true,
        Event::Start(tag) => matches!(
            tag,
            Tag::Emphasis
                | Tag::Strong
                | Tag::Strikethrough
                | Tag::Link { .. }
                | Tag::Image { .. }
        ),
        _ => false,
    }
}

/// Consume the `End` event closing the container that was just parsed
fn skip_end<'a, I: Iterator<Item = Event<'a>>>(events: &mut Peekable<I>) {
    if matches!(events.peek(), Some(Event::End(_))) {
        events.next();
    }
}

fn parse_blocks<'a, I: Iterator<Item = Event<'a>>>(events: &mut Peekable<I>) -> Vec<Block> {
    let mut blocks = Vec::new();

    loop {
        let inline_next = match events.peek() {
            None | Some(Event::End(_)) => break,
            Some(event) => is_inline(event),
        };
        if inline_next {
            // Tight list items carry their text without a paragraph
            let content = parse_inlines(events);
            blocks.push(Block::Paragraph { content });
            continue;
        }

        let Some(event) = events.next() else { break };
        match event {
            Event::Start(Tag::Paragraph) => {
                let content = parse_inlines(events);
                skip_end(events);
                blocks.push(Block::Paragraph { content });
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let content = parse_inlines(events);
                skip_end(events);
                blocks.push(Block::Heading {
                    level: level as u8,
                    content,
                });
            }
            Event::Start(Tag::BlockQuote(_)) => {
                let inner = parse_blocks(events);
                skip_end(events);
                blocks.push(Block::BlockQuote { blocks: inner });
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                let code = collect_raw(events);
                blocks.push(Block::CodeBlock { lang, code });
            }
            Event::Start(Tag::HtmlBlock) => {
                let html = collect_raw(events);
                blocks.push(Block::Html { html });
            }
            Event::Start(Tag::List(start)) => {
                blocks.push(parse_list(events, start));
            }
            Event::Start(Tag::Table(alignments)) => {
                blocks.push(parse_table(events, &alignments));
            }
            Event::Start(Tag::FootnoteDefinition(label)) => {
                let inner = parse_blocks(events);
                skip_end(events);
                blocks.push(Block::FootnoteDefinition {
                    label: label.to_string(),
                    blocks: inner,
                });
            }
            Event::Start(_) => {
                // Containers without a dedicated block keep their children
                blocks.extend(parse_blocks(events));
                skip_end(events);
            }
            Event::Rule => blocks.push(Block::Rule),
            Event::Html(html) => blocks.push(Block::Html {
                html: html.to_string(),
            }),
            Event::DisplayMath(math) => blocks.push(Block::CodeBlock {
                lang: Some("math".to_string()),
                code: math.to_string(),
            }),
            _ => {}
        }
    }

    blocks
}

/// Text of a code or HTML block up to and including its `End`
fn collect_raw<'a, I: Iterator<Item = Event<'a>>>(events: &mut Peekable<I>) -> String {
    let mut raw = String::new();
    for event in events.by_ref() {
        match event {
            Event::End(_) => break,
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                raw.push_str(&text)
            }
            _ => {}
        }
    }
    raw
}

fn parse_list<'a, I: Iterator<Item = Event<'a>>>(
    events: &mut Peekable<I>,
    start: Option<u64>,
) -> Block {
    let mut items = Vec::new();
    let mut tight = true;

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::Item) => {
                if matches!(events.peek(), Some(Event::Start(Tag::Paragraph))) {
                    tight = false;
                }
                let blocks = parse_blocks(events);
                skip_end(events);
                items.push(ListItem { blocks });
            }
            Event::End(_) => break,
            _ => {}
        }
    }

    Block::List {
        start,
        tight,
        items,
    }
}

fn parse_table<'a, I: Iterator<Item = Event<'a>>>(
    events: &mut Peekable<I>,
    alignments: &[CmarkAlignment],
) -> Block {
    let alignments = alignments
        .iter()
        .map(|a| match a {
            CmarkAlignment::None => Alignment::None,
            CmarkAlignment::Left => Alignment::Left,
            CmarkAlignment::Center => Alignment::Center,
            CmarkAlignment::Right => Alignment::Right,
        })
        .collect();

    let mut header = Vec::new();
    let mut rows = Vec::new();

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::TableHead) => {
                header = parse_cells(events);
                skip_end(events);
            }
            Event::Start(Tag::TableRow) => {
                rows.push(parse_cells(events));
                skip_end(events);
            }
            Event::End(_) => break,
            _ => {}
        }
    }

    Block::Table {
        alignments,
        header,
        rows,
    }
}

fn parse_cells<'a, I: Iterator<Item = Event<'a>>>(events: &mut Peekable<I>) -> Vec<Vec<Inline>> {
    let mut cells = Vec::new();
    while matches!(events.peek(), Some(Event::Start(Tag::TableCell))) {
        events.next();
        cells.push(parse_inlines(events));
        skip_end(events);
    }
    cells
}

fn push_text(content: &mut Vec<Inline>, text: &str) {
    if let Some(Inline::Text { text: last }) = content.last_mut() {
        last.push_str(text);
    } else {
        content.push(Inline::text(text));
    }
}

fn parse_inlines<'a, I: Iterator<Item = Event<'a>>>(events: &mut Peekable<I>) -> Vec<Inline> {
    let mut content = Vec::new();

    loop {
        match events.peek() {
            Some(event) if is_inline(event) => {}
            _ => break,
        }
        let Some(event) = events.next() else { break };

        match event {
            Event::Text(text) => push_text(&mut content, &text),
            Event::InlineMath(math) => push_text(&mut content, &format!("${math}$")),
            Event::Code(code) => content.push(Inline::Code {
                code: code.to_string(),
            }),
            Event::InlineHtml(html) => content.push(Inline::Html {
                html: html.to_string(),
            }),
            Event::SoftBreak => content.push(Inline::SoftBreak),
            Event::HardBreak => content.push(Inline::HardBreak),
            Event::FootnoteReference(label) => content.push(Inline::FootnoteReference {
                label: label.to_string(),
            }),
            Event::TaskListMarker(checked) => content.push(Inline::TaskMarker { checked }),
            Event::Start(Tag::Emphasis) => {
                let inner = parse_inlines(events);
                skip_end(events);
                content.push(Inline::Emphasis { content: inner });
            }
            Event::Start(Tag::Strong) => {
                let inner = parse_inlines(events);
                skip_end(events);
                content.push(Inline::Strong { content: inner });
            }
            Event::Start(Tag::Strikethrough) => {
                let inner = parse_inlines(events);
                skip_end(events);
                content.push(Inline::Strikethrough { content: inner });
            }
            Event::Start(Tag::Link {
                dest_url, title, ..
            }) => {
                let inner = parse_inlines(events);
                skip_end(events);
                content.push(Inline::Link {
                    url: dest_url.to_string(),
                    title: title.to_string(),
                    content: inner,
                });
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) => {
                let alt = parse_inlines(events);
                skip_end(events);
                content.push(Inline::Image {
                    url: dest_url.to_string(),
                    title: title.to_string(),
                    alt,
                });
            }
            Event::Start(_) => {
                for inline in parse_inlines(events) {
                    match inline {
                        Inline::Text { text } => push_text(&mut content, &text),
                        other => content.push(other),
                    }
                }
                skip_end(events);
            }
            _ => {}
        }
    }

    content
}
