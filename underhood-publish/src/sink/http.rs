//! Remote document service over JSON/HTTP.
//!
//! - `POST {base}/pages` with the page metadata, answered by `{id, url}`
//! - `POST {base}/pages/{id}/blocks` with `{index, block}`
//!
//! The client never retries on its own; [`publish`](crate::publish) owns
//! the retry policy.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use underhood_document::{Block, PageMeta};
use underhood_http::{HttpClient, RequestOpts};
use url::Url;

use super::{DocumentSink, PageHandle};
use crate::error::PublishError;

pub struct HttpDocumentSink {
    client: HttpClient,
    token: String,
}

#[derive(Deserialize)]
struct CreatedPage {
    id: String,
    url: String,
}

#[derive(Serialize)]
struct AppendBlock<'a> {
    index: usize,
    block: &'a Block,
}

impl HttpDocumentSink {
    pub fn new(
        endpoint: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PublishError> {
        // Url::join drops the last segment unless the base ends in '/'.
        let base = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let client = HttpClient::new(&base)?
            .with_timeout(timeout)
            .with_retries(0);
        Ok(Self {
            client,
            token: token.into(),
        })
    }

    fn opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            bearer: Some(&self.token),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl DocumentSink for HttpDocumentSink {
    async fn create_page(&self, meta: &PageMeta) -> Result<PageHandle, PublishError> {
        let created: CreatedPage = self.client.post_json("pages", meta, self.opts()).await?;
        let slug = slug_from_url(&created.url).unwrap_or_else(|| created.id.clone());
        tracing::info!(id = %created.id, url = %created.url, "docs.page_created");
        Ok(PageHandle {
            id: created.id,
            url: created.url,
            slug,
        })
    }

    async fn append(
        &self,
        page: &PageHandle,
        index: usize,
        block: &Block,
    ) -> Result<(), PublishError> {
        let path = format!("pages/{}/blocks", page.id);
        self.client
            .post_json_discard(&path, &AppendBlock { index, block }, self.opts())
            .await?;
        Ok(())
    }
}

/// Last non-empty path segment of a page URL.
fn slug_from_url(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_is_last_path_segment() {
        let slug = |url: &str| slug_from_url(url);
        assert_eq!(slug("https://docs.example/p/alice-3f2a").as_deref(), Some("alice-3f2a"));
        assert_eq!(slug("https://docs.example/p/alice/?x=1").as_deref(), Some("alice"));
        assert_eq!(slug("https://docs.example/p/alice-3f2a#top").as_deref(), Some("alice-3f2a"));
    }

    #[test]
    fn unusable_urls_have_no_slug() {
        assert_eq!(slug_from_url(""), None);
        assert_eq!(slug_from_url("https://docs.example/"), None);
        assert_eq!(slug_from_url("not a url"), None);
        assert_eq!(slug_from_url("mailto:alice@docs.example"), None);
    }
}
