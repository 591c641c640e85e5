//! Publishing boundary for built documents.
//!
//! A [`DocumentSink`] persists one page and its blocks. [`publish`] feeds a
//! [`Document`](underhood_document::Document) through a sink, retrying
//! transient failures under a [`RetryPolicy`](underhood_common::RetryPolicy).
//! [`RedirectScript`] keeps the `username -> page slug` map in an externally
//! hosted script up to date.
pub mod error;
pub mod publisher;
pub mod redirect;
pub mod sink;

pub use error::PublishError;
pub use publisher::publish;
pub use redirect::{RedirectScript, splice_redirect};
pub use sink::{DocumentSink, PageHandle, http::HttpDocumentSink, markdown::MarkdownSink};
