//! Local Markdown output: one `<slug>.md` per page with YAML front matter.
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use underhood_document::{Block, PageMeta};

use super::{DocumentSink, PageHandle};
use crate::error::PublishError;

struct Draft {
    front_matter: String,
    blocks: BTreeMap<usize, String>,
}

/// Buffers blocks by index and writes the file on [`DocumentSink::finish`],
/// so replaying an `append` overwrites instead of duplicating.
pub struct MarkdownSink {
    dir: PathBuf,
    drafts: Mutex<HashMap<String, Draft>>,
}

impl MarkdownSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            drafts: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.md"))
    }
}

#[async_trait::async_trait]
impl DocumentSink for MarkdownSink {
    async fn create_page(&self, meta: &PageMeta) -> Result<PageHandle, PublishError> {
        let slug = meta.username().to_lowercase();
        let path = self.path_for(&slug);
        let front_matter = serde_yaml::to_string(meta)?;
        self.drafts.lock().await.insert(
            slug.clone(),
            Draft {
                front_matter,
                blocks: BTreeMap::new(),
            },
        );
        Ok(PageHandle {
            id: slug.clone(),
            url: path.display().to_string(),
            slug,
        })
    }

    async fn append(
        &self,
        page: &PageHandle,
        index: usize,
        block: &Block,
    ) -> Result<(), PublishError> {
        let mut drafts = self.drafts.lock().await;
        let draft = drafts
            .get_mut(&page.id)
            .ok_or_else(|| PublishError::UnknownPage(page.id.clone()))?;
        draft.blocks.insert(index, render_block(block));
        Ok(())
    }

    async fn finish(&self, page: &PageHandle) -> Result<(), PublishError> {
        let draft = self
            .drafts
            .lock()
            .await
            .remove(&page.id)
            .ok_or_else(|| PublishError::UnknownPage(page.id.clone()))?;

        let mut out = format!("---\n{}---\n", draft.front_matter);
        for fragment in draft.blocks.values() {
            out.push('\n');
            out.push_str(fragment);
            out.push('\n');
        }

        let io_err = |source| PublishError::Io {
            path: self.dir.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        let path = self.path_for(&page.slug);
        tokio::fs::write(&path, out)
            .await
            .map_err(|source| PublishError::Io {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = %path.display(), blocks = draft.blocks.len(), "markdown.written");
        Ok(())
    }
}

/// Markdown for a single block.
pub fn render_block(block: &Block) -> String {
    match block {
        Block::TableOfContents => "<!-- toc -->".to_string(),
        Block::Header { text } => format!("# {text}"),
        Block::SubHeader { text } => format!("## {text}"),
        Block::Divider => "---".to_string(),
        Block::Text { text, muted: false } => text.clone(),
        Block::Text { text, muted: true } => format!("_{text}_"),
        Block::Quote { text } => text
            .lines()
            .map(|line| format!("> {line}"))
            .collect::<Vec<_>>()
            .join("\n"),
        Block::Image { source } => format!("![]({source})"),
        Block::Bookmark { link } => format!("<{link}>"),
    }
}
