//! Structured content extracted from a documentation page.
//!
//! A page is a flat, ordered outline of [`Section`]s. Each section starts at
//! a heading and holds the blocks that appear before the next heading of any
//! level; the heading level carries the nesting, see
//! [`ExtractedContent::section_span`].

use serde::{Deserialize, Serialize};

/// Parsed content of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// URL the content was extracted from.
    pub url: String,

    /// Page title (`og:title`, falling back to `<title>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Page description (`og:description`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sections in document order.
    pub sections: Vec<Section>,
}

/// A heading and the blocks directly beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading that opens the section. `None` only for content that precedes
    /// the first heading on the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<Heading>,

    /// Body elements in document order.
    pub blocks: Vec<Block>,
}

/// A page heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level, 1 through 6.
    pub level: u8,

    /// Heading text, whitespace-collapsed.
    pub text: String,
}

/// A body element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A paragraph of prose.
    Paragraph { text: String },

    /// A bulleted or numbered list.
    List { ordered: bool, items: Vec<String> },

    /// A table. `headers` may be empty when the table has no header row.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },

    /// A preformatted code block.
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        text: String,
    },
}

impl Section {
    /// Create a section opened by a heading.
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            heading: Some(Heading {
                level,
                text: text.into(),
            }),
            blocks: Vec::new(),
        }
    }

    /// Create the untitled leading section.
    pub fn preamble() -> Self {
        Self {
            heading: None,
            blocks: Vec::new(),
        }
    }

    /// Append a block.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Heading level, treating the preamble as level 0.
    pub fn level(&self) -> u8 {
        self.heading.as_ref().map_or(0, |h| h.level)
    }
}

impl ExtractedContent {
    /// Create empty content for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            description: None,
            sections: Vec::new(),
        }
    }

    /// Build content from plain text, one paragraph per blank-line-separated
    /// run. Used for catalog summaries and search snippets.
    pub fn from_text(url: impl Into<String>, title: impl Into<String>, text: &str) -> Self {
        let title = title.into();
        let mut section = Section::preamble();
        for para in text.split("\n\n") {
            let collapsed = para.split_whitespace().collect::<Vec<_>>().join(" ");
            if !collapsed.is_empty() {
                section.blocks.push(Block::Paragraph { text: collapsed });
            }
        }

        let mut content = Self::new(url);
        content.title = (!title.is_empty()).then_some(title);
        if !section.blocks.is_empty() {
            content.sections.push(section);
        }
        content
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a section.
    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Total number of body blocks across all sections.
    pub fn block_count(&self) -> usize {
        self.sections.iter().map(|s| s.blocks.len()).sum()
    }

    /// Whether the page yielded no body content at all.
    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    /// Iterate over all blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }

    /// The sections owned by the section at `index`: itself plus every
    /// following section until the next heading at the same or a shallower
    /// level.
    pub fn section_span(&self, index: usize) -> &[Section] {
        let Some(first) = self.sections.get(index) else {
            return &[];
        };
        let level = first.level();
        let end = self.sections[index + 1..]
            .iter()
            .position(|s| s.level() <= level)
            .map_or(self.sections.len(), |offset| index + 1 + offset);
        &self.sections[index..end]
    }
}
