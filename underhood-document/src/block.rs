//! Render instructions and page metadata handed to a document sink.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::Date;

/// One typed unit of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    TableOfContents,
    Header {
        text: String,
    },
    SubHeader {
        text: String,
    },
    Divider,
    /// Markdown text. `muted` marks secondary lines such as timestamps.
    Text {
        text: String,
        #[serde(default)]
        muted: bool,
    },
    Quote {
        text: String,
    },
    Image {
        source: String,
    },
    Bookmark {
        link: String,
    },
}

impl Block {
    pub fn text(text: impl Into<String>) -> Self {
        Block::Text {
            text: text.into(),
            muted: false,
        }
    }

    pub fn muted(text: impl Into<String>) -> Self {
        Block::Text {
            text: text.into(),
            muted: true,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::TableOfContents => "table_of_contents",
            Block::Header { .. } => "header",
            Block::SubHeader { .. } => "sub_header",
            Block::Divider => "divider",
            Block::Text { .. } => "text",
            Block::Quote { .. } => "quote",
            Block::Image { .. } => "image",
            Block::Bookmark { .. } => "bookmark",
        }
    }
}

/// Calendar dates of the first and last archive record, local to the
/// document's offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// `@username`
    pub title: String,
    /// `twitter.com/username`
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl PageMeta {
    pub fn username(&self) -> &str {
        self.title.trim_start_matches('@')
    }
}
