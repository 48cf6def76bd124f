//! HTML to structured content.
//!
//! The parser picks the main content root, then walks it in document order.
//! Headings open sections; paragraphs, lists, code and tables become blocks
//! of the current section.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

use docground_doc_cache::{Block, ExtractedContent, Section};

use crate::error::{ExtractionError, Result};

/// Elements never descended into.
const SKIPPED: &[&str] = &[
    "script", "style", "nav", "footer", "aside", "noscript", "template", "svg", "form",
];

/// Sectioning elements whose `header` belongs to the content rather than
/// the page chrome.
const SECTIONING: &[&str] = &["main", "article", "section"];

/// Parser tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Paragraphs shorter than this many characters are dropped.
    pub min_paragraph_chars: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            min_paragraph_chars: 20,
        }
    }
}

/// Parse a page into sections and blocks.
///
/// Fails with [`ExtractionError::EmptyContent`] if the page has no blocks.
pub fn parse_html(url: &str, html: &str, options: &ParseOptions) -> Result<ExtractedContent> {
    let document = Html::parse_document(html);
    let root = content_root(&document);

    let mut walker = Walker {
        options,
        sections: vec![Section::preamble()],
    };
    walker.walk(root);

    let sections: Vec<Section> = walker
        .sections
        .into_iter()
        .filter(|s| s.heading.is_some() || !s.blocks.is_empty())
        .collect();

    let mut content = ExtractedContent::new(url);
    content.sections = sections;
    if content.is_empty() {
        return Err(ExtractionError::EmptyContent);
    }

    content.title = meta_content(&document, "og:title")
        .or_else(|| first_text(&document, "title"))
        .or_else(|| {
            content
                .sections
                .iter()
                .find_map(|s| s.heading.as_ref().filter(|h| h.level == 1))
                .map(|h| h.text.clone())
        });
    content.description = meta_content(&document, "og:description")
        .or_else(|| meta_content(&document, "description"));

    Ok(content)
}

/// First `main`, then `article`, then `div.content`, then `body`.
fn content_root(document: &Html) -> ElementRef<'_> {
    let elements = || document.root_element().descendants().filter_map(ElementRef::wrap);
    let is = |name: &'static str| move |el: &ElementRef<'_>| el.value().name() == name;

    elements()
        .find(is("main"))
        .or_else(|| elements().find(is("article")))
        .or_else(|| {
            elements().find(|el| {
                el.value().name() == "div" && el.value().classes().any(|c| c == "content")
            })
        })
        .or_else(|| elements().find(is("body")))
        .unwrap_or_else(|| document.root_element())
}

struct Walker<'o> {
    options: &'o ParseOptions,
    sections: Vec<Section>,
}

impl Walker<'_> {
    fn push(&mut self, block: Block) {
        if let Some(section) = self.sections.last_mut() {
            section.blocks.push(block);
        }
    }

    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children().filter_map(ElementRef::wrap) {
            let name = child.value().name();
            if SKIPPED.contains(&name) || (name == "header" && !is_content_header(child)) {
                continue;
            }
            match name {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    let text = collapsed_text(child);
                    if !text.is_empty() {
                        let level = name[1..].parse().unwrap_or(6);
                        self.sections.push(Section::new(level, text));
                    }
                }
                "p" => {
                    let text = collapsed_text(child);
                    if text.chars().count() >= self.options.min_paragraph_chars {
                        self.push(Block::Paragraph { text });
                    }
                }
                "ul" | "ol" => {
                    let items: Vec<String> = child
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|li| li.value().name() == "li")
                        .map(collapsed_text)
                        .filter(|t| !t.is_empty())
                        .collect();
                    if !items.is_empty() {
                        self.push(Block::List {
                            ordered: name == "ol",
                            items,
                        });
                    }
                }
                "pre" => {
                    let text = raw_text(child);
                    if !text.trim().is_empty() {
                        self.push(Block::Code {
                            language: code_language(child),
                            text: text.trim_matches('\n').to_string(),
                        });
                    }
                }
                "table" => {
                    if let Some(block) = table_block(child) {
                        self.push(block);
                    }
                }
                _ => self.walk(child),
            }
        }
    }
}

/// A `header` nested in `main`, `article` or `section` carries the
/// document's own title; a page-level `header` is site chrome.
fn is_content_header(header: ElementRef<'_>) -> bool {
    header
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| SECTIONING.contains(&el.value().name()))
}

fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    raw_text(element).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Language from a `lang-*` or `language-*` class on `pre` or its `code`.
fn code_language(pre: ElementRef<'_>) -> Option<String> {
    std::iter::once(pre)
        .chain(
            pre.children()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "code"),
        )
        .flat_map(|el| el.value().classes())
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .filter(|lang| !lang.is_empty())
                .map(str::to_string)
        })
}

fn table_block(table: ElementRef<'_>) -> Option<Block> {
    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    let trs = table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr");

    for tr in trs {
        let in_head = tr
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(|p| p.value().name() == "thead");
        let cells: Vec<ElementRef<'_>> = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "td" | "th"))
            .collect();
        if cells.is_empty() {
            continue;
        }
        let all_th = cells.iter().all(|c| c.value().name() == "th");
        let texts: Vec<String> = cells.into_iter().map(collapsed_text).collect();

        if headers.is_empty() && rows.is_empty() && (in_head || all_th) {
            headers = texts;
        } else if !in_head && texts.iter().any(|t| !t.is_empty()) {
            rows.push(texts);
        }
    }

    (!headers.is_empty() || !rows.is_empty()).then_some(Block::Table { headers, rows })
}

fn meta_content(document: &Html, key: &str) -> Option<String> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "meta")
        .find(|el| {
            let attr = |name| el.value().attr(name);
            attr("property") == Some(key) || attr("name") == Some(key)
        })
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|c| !c.is_empty())
}

fn first_text(document: &Html, name: &str) -> Option<String> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == name)
        .map(collapsed_text)
        .filter(|t| !t.is_empty())
}
