use underhood_common::RetryPolicy;
use underhood_document::Document;

use crate::error::PublishError;
use crate::sink::{DocumentSink, PageHandle};

/// Create the page and append every block in order, each call under
/// `policy`. Terminal errors stop publishing right away.
///
/// A page creation that times out after the service accepted it will be
/// retried and can leave an orphan page behind.
pub async fn publish(
    sink: &dyn DocumentSink,
    document: &Document,
    policy: &RetryPolicy,
) -> Result<PageHandle, PublishError> {
    let meta = &document.meta;
    tracing::info!(title = %meta.title, blocks = document.blocks.len(), "publish.start");

    let page = policy
        .run("create_page", PublishError::is_transient, || sink.create_page(meta))
        .await?;

    for (index, block) in document.blocks.iter().enumerate() {
        policy
            .run(block.kind(), PublishError::is_transient, || {
                sink.append(&page, index, block)
            })
            .await?;
        tracing::debug!(index, kind = block.kind(), "publish.block");
    }

    policy
        .run("finish", PublishError::is_transient, || sink.finish(&page))
        .await?;
    tracing::info!(id = %page.id, url = %page.url, slug = %page.slug, "publish.done");
    Ok(page)
}
