//! Serde models for tweets as they appear in account archive dumps.
//!
//! Field names follow the archive JSON. Required fields are plain types so a
//! missing one fails deserialization; unknown fields are ignored.
use serde::{Deserialize, Serialize};

/// Top-level dump file: `{ "tweets": [...] }`, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveDump {
    pub tweets: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveTweet {
    pub id_str: String,
    pub full_text: String,
    /// e.g. `Wed Oct 10 20:19:24 +0000 2018`
    pub created_at: String,
    pub is_quote_status: bool,
    /// Absent when the quoted tweet was deleted or is otherwise unavailable.
    #[serde(default)]
    pub quoted_status: Option<QuotedStatus>,
    pub entities: Entities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotedStatus {
    pub full_text: String,
    pub entities: QuotedEntities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotedEntities {
    pub urls: Vec<UrlEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entities {
    pub user_mentions: Vec<MentionEntity>,
    pub hashtags: Vec<HashTag>,
    pub urls: Vec<UrlEntity>,
    #[serde(default)]
    pub media: Option<Vec<MediaEntity>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntity {
    /// The t.co short link as it appears in the text.
    pub url: String,
    pub display_url: String,
    pub expanded_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub media_url_https: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionEntity {
    pub screen_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashTag {
    pub text: String,
}
