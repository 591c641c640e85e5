use serde::{Deserialize, Serialize};
use underhood_document::{Block, PageMeta};

use crate::error::PublishError;

pub mod http;
pub mod markdown;

/// A page created by a sink. `slug` is the stable, browseable part of its
/// address and is what redirects point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHandle {
    pub id: String,
    pub url: String,
    pub slug: String,
}

/// Something that persists a page and its blocks.
///
/// `append` receives the block's position so a replayed call after a
/// transient failure can be recognised instead of duplicated.
#[async_trait::async_trait]
pub trait DocumentSink: Send + Sync {
    async fn create_page(&self, meta: &PageMeta) -> Result<PageHandle, PublishError>;

    async fn append(
        &self,
        page: &PageHandle,
        index: usize,
        block: &Block,
    ) -> Result<(), PublishError>;

    /// Called once after the last block.
    async fn finish(&self, _page: &PageHandle) -> Result<(), PublishError> {
        Ok(())
    }
}
