//! Plain-text rendering of an answer context for a generator prompt.

use std::fmt::Write as _;

use docground_doc_cache::{Block, ExtractedContent};

use crate::orchestrator::{AnswerContext, ContentOutcome};

/// Per-source caps on rendered blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    pub paragraphs: usize,
    pub lists: usize,
    pub code_blocks: usize,
    pub tables: usize,
    pub table_rows: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self {
            paragraphs: 15,
            lists: 5,
            code_blocks: 2,
            tables: 2,
            table_rows: 5,
        }
    }
}

/// Render every source as a numbered `SOURCE [i]` block.
///
/// Sources whose content failed are listed as unavailable so the generator
/// can flag rather than cite them.
pub fn render_prompt_context(answer: &AnswerContext, limits: &RenderLimits) -> String {
    let mut out = String::new();
    for (index, doc) in answer.sources.iter().enumerate() {
        if index > 0 {
            out.push_str("\n\n");
        }
        let _ = writeln!(out, "SOURCE [{}]: {}", index + 1, doc.title);
        let _ = writeln!(out, "URL: {}", doc.url);
        if let Some(org) = &doc.organization {
            let _ = writeln!(out, "Publisher: {org}");
        }

        match answer.contents.get(&doc.url) {
            Some(ContentOutcome::Extracted { content, .. }) => {
                out.push('\n');
                render_content(&mut out, content, limits);
            }
            Some(ContentOutcome::Failed { error }) => {
                let _ = writeln!(out, "Content unavailable: {error}");
            }
            None => {
                let _ = writeln!(out, "Content unavailable");
            }
        }
    }
    out.trim_end().to_string()
}

fn render_content(out: &mut String, content: &ExtractedContent, limits: &RenderLimits) {
    if let Some(title) = &content.title {
        let _ = writeln!(out, "# {title}");
    }
    if let Some(description) = &content.description {
        let _ = writeln!(out, "**Description:** {description}");
    }

    let mut used = RenderLimits {
        paragraphs: 0,
        lists: 0,
        code_blocks: 0,
        tables: 0,
        table_rows: 0,
    };

    for section in &content.sections {
        if let Some(heading) = &section.heading {
            let hashes = "#".repeat(usize::from(heading.level.clamp(1, 6)) + 1);
            let _ = writeln!(out, "\n{hashes} {}", heading.text);
        }
        for block in &section.blocks {
            match block {
                Block::Paragraph { text } if used.paragraphs < limits.paragraphs => {
                    used.paragraphs += 1;
                    let _ = writeln!(out, "{text}");
                }
                Block::List { ordered, items } if used.lists < limits.lists => {
                    used.lists += 1;
                    for (i, item) in items.iter().enumerate() {
                        if *ordered {
                            let _ = writeln!(out, "{}. {item}", i + 1);
                        } else {
                            let _ = writeln!(out, "- {item}");
                        }
                    }
                }
                Block::Code { language, text } if used.code_blocks < limits.code_blocks => {
                    used.code_blocks += 1;
                    let lang = language.as_deref().unwrap_or_default();
                    let _ = writeln!(out, "```{lang}\n{text}\n```");
                }
                Block::Table { headers, rows } if used.tables < limits.tables => {
                    used.tables += 1;
                    if !headers.is_empty() {
                        let _ = writeln!(out, "{}", headers.join(" | "));
                        let _ = writeln!(out, "{}", vec!["---"; headers.len()].join(" | "));
                    }
                    for row in rows.iter().take(limits.table_rows) {
                        let _ = writeln!(out, "{}", row.join(" | "));
                    }
                }
                _ => {}
            }
        }
    }
}

impl AnswerContext {
    /// Render with the default limits.
    pub fn render_prompt_context(&self) -> String {
        render_prompt_context(self, &RenderLimits::default())
    }
}
