//! Twitter/X archive records and the per-tweet transformation pipeline.
//!
//! [`parse`] turns one raw archive record into a [`Tweet`]; [`Tweet::rewrite`]
//! replaces short URLs, mentions and hashtags with Markdown links and pulls
//! out images and external links.
pub mod parse;
pub mod rewrite;
pub mod types;

pub use parse::{ParseError, Tweet, TweetMedia, TweetUrl, parse};
pub use rewrite::{Rewritten, rewrite};
