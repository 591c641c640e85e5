//! Normalize one archive record into a [`Tweet`].
use serde::Deserialize;
use serde_json::Value;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::twitter::types::{ArchiveTweet, MediaEntity, UrlEntity};

/// A link entity: the short URL in the text, what to show, where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetUrl {
    pub short_url: String,
    pub display_text: String,
    pub resolved_url: String,
}

/// Native media attached to a tweet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetMedia {
    /// `photo`, `video`, `animated_gif`; only photos are rendered.
    pub kind: String,
    pub short_url: String,
    pub resolved_url: String,
}

/// One post, normalized from its archive record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tweet {
    pub id: String,
    /// Replies and retweets contribute nothing to the document.
    pub ignore: bool,
    /// Creation time as recorded in the archive.
    pub created_at: OffsetDateTime,
    /// Creation time converted to the document's fixed offset.
    pub date: OffsetDateTime,
    pub text: String,
    pub quote: Option<String>,
    pub urls: Vec<TweetUrl>,
    pub quote_urls: Vec<TweetUrl>,
    pub media: Vec<TweetMedia>,
    pub mentions: Vec<String>,
    pub hashtags: Vec<String>,
    /// Filled by [`Tweet::rewrite`](crate::twitter::Tweet::rewrite); empty after parsing.
    pub images: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed tweet record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },
}

const UNKNOWN_ID: &str = "<unknown>";

/// Parse one raw archive record, shifting its timestamp to `offset`.
///
/// Fails with [`ParseError::MalformedRecord`] when a required field is
/// missing or `created_at` is not in the archive format.
pub fn parse(raw: &Value, offset: UtcOffset) -> Result<Tweet, ParseError> {
    let record = ArchiveTweet::deserialize(raw).map_err(|e| {
        let id = raw
            .get("id_str")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_ID);
        tracing::warn!(id, error = %e, "tweet.malformed");
        ParseError::MalformedRecord {
            id: id.to_string(),
            reason: e.to_string(),
        }
    })?;
    Tweet::from_record(record, offset)
}

/// Parse the archive's `created_at`, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
pub fn parse_created_at(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(
        raw,
        format_description!(
            "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
        ),
    )
}

impl Tweet {
    pub fn from_record(record: ArchiveTweet, offset: UtcOffset) -> Result<Self, ParseError> {
        let created_at = parse_created_at(&record.created_at).map_err(|e| {
            tracing::warn!(
                id = %record.id_str,
                created_at = %record.created_at,
                error = %e,
                "tweet.malformed"
            );
            ParseError::MalformedRecord {
                id: record.id_str.clone(),
                reason: format!("created_at {:?}: {e}", record.created_at),
            }
        })?;
        let date = created_at.to_offset(offset);

        let ignore = record.full_text.starts_with('@') || record.full_text.starts_with("RT @");

        let (quote, quote_urls) = match record.quoted_status {
            Some(quoted) if record.is_quote_status => (
                Some(quoted.full_text),
                quoted.entities.urls.into_iter().map(TweetUrl::from).collect(),
            ),
            _ => (None, Vec::new()),
        };

        let entities = record.entities;
        Ok(Self {
            id: record.id_str,
            ignore,
            created_at,
            date,
            text: record.full_text,
            quote,
            urls: entities.urls.into_iter().map(TweetUrl::from).collect(),
            quote_urls,
            media: entities
                .media
                .unwrap_or_default()
                .into_iter()
                .map(TweetMedia::from)
                .collect(),
            mentions: entities
                .user_mentions
                .into_iter()
                .map(|m| m.screen_name)
                .collect(),
            hashtags: entities.hashtags.into_iter().map(|h| h.text).collect(),
            images: Vec::new(),
        })
    }
}

impl From<UrlEntity> for TweetUrl {
    fn from(u: UrlEntity) -> Self {
        Self {
            short_url: u.url,
            display_text: u.display_url,
            resolved_url: u.expanded_url,
        }
    }
}

impl From<MediaEntity> for TweetMedia {
    fn from(m: MediaEntity) -> Self {
        Self {
            kind: m.kind,
            short_url: m.url,
            resolved_url: m.media_url_https,
        }
    }
}
