//! Week-archive documents built from an author's tweets.
//!
//! [`build`] parses every archive record, rewrites each kept tweet and lays
//! the result out as an ordered list of [`Block`]s grouped by weekday,
//! followed by the deduplicated external links. Nothing here performs I/O;
//! publishing lives in `underhood-publish`.
pub mod block;
pub mod builder;
pub mod labels;
pub mod links;

pub use block::{Block, DateRange, PageMeta};
pub use builder::{Author, Document, DocumentError, build};
pub use labels::{
    DEFAULT_DAYS, DEFAULT_LINKS_TITLE, DEFAULT_OFFSET, DEFAULT_WEEK_TITLE, LocalizedLabels,
};
pub use links::LinkCollector;
