use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Weekday;
use underhood_social::twitter::{ParseError, Rewritten, Tweet, parse};

use crate::block::{Block, DateRange, PageMeta};
use crate::labels::LocalizedLabels;
use crate::links::LinkCollector;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("expected 7 day names starting at Monday, got {0}")]
    DayNames(usize),
    #[error("utc offset of {0} minutes is out of range")]
    Offset(i32),
}

/// An author and their archive records, oldest first.
///
/// Day grouping only looks at the weekday, so the records are expected to
/// cover at most seven calendar days.
#[derive(Debug, Clone, Default)]
pub struct Author {
    pub username: String,
    pub tweets: Vec<Value>,
    pub topics: Option<BTreeSet<String>>,
    pub avatar: Option<String>,
}

impl Author {
    pub fn new(username: impl Into<String>, tweets: Vec<Value>) -> Self {
        Self {
            username: username.into(),
            tweets,
            ..Default::default()
        }
    }

    pub fn with_topics(mut self, topics: impl IntoIterator<Item = String>) -> Self {
        let topics: BTreeSet<String> = topics.into_iter().collect();
        self.topics = (!topics.is_empty()).then_some(topics);
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }
}

/// A built document: page metadata, the ordered blocks, and the sorted
/// link list that the trailing bookmark blocks were made from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub meta: PageMeta,
    pub blocks: Vec<Block>,
    pub links: Vec<String>,
}

/// Build the week archive for `author`.
///
/// Every record is parsed before any block is produced; a malformed record
/// fails the whole build.
pub fn build(author: &Author, labels: &LocalizedLabels) -> Result<Document, DocumentError> {
    let tweets = author
        .tweets
        .iter()
        .map(|raw| parse(raw, labels.offset()))
        .collect::<Result<Vec<Tweet>, _>>()?;

    let username = author.username.as_str();
    let meta = PageMeta {
        title: format!("@{username}"),
        handle: format!("twitter.com/{username}"),
        dates: date_range(&tweets),
        topics: author.topics.clone(),
        avatar: author.avatar.clone(),
    };

    let mut blocks = vec![
        Block::TableOfContents,
        Block::Header {
            text: format!("{} @{username}", labels.week_title()),
        },
    ];
    let mut links = LinkCollector::new();
    let mut current_day: Option<Weekday> = None;
    let mut posts = 0usize;

    for tweet in tweets {
        if tweet.ignore {
            tracing::debug!(id = %tweet.id, "tweet.ignored");
            continue;
        }
        let Rewritten { tweet, links: found } = tweet.rewrite();
        links.extend(found);

        let day = tweet.date.weekday();
        if current_day != Some(day) {
            current_day = Some(day);
            tracing::debug!(day = labels.day_name(day), date = %tweet.date.date(), "document.day");
            blocks.push(Block::SubHeader {
                text: labels.day_name(day).to_string(),
            });
            blocks.push(Block::Divider);
        }

        let time = format!("{:02}:{:02}", tweet.date.hour(), tweet.date.minute());
        blocks.push(Block::muted(format!(
            "[{time}](https://twitter.com/{username}/status/{})",
            tweet.id
        )));
        if let Some(quote) = tweet.quote.filter(|q| !q.is_empty()) {
            blocks.push(Block::Quote { text: quote });
        }
        if !tweet.text.is_empty() {
            blocks.push(Block::text(tweet.text));
        }
        blocks.extend(
            tweet
                .images
                .into_iter()
                .map(|source| Block::Image { source }),
        );
        blocks.push(Block::Divider);
        posts += 1;
    }

    blocks.push(Block::Header {
        text: labels.links_title().to_string(),
    });
    let links = links.snapshot();
    blocks.extend(links.iter().map(|link| Block::Bookmark { link: link.clone() }));

    tracing::info!(
        author = username,
        records = author.tweets.len(),
        posts,
        blocks = blocks.len(),
        links = links.len(),
        "document.built"
    );
    Ok(Document { meta, blocks, links })
}

/// Calendar dates of the first and last record as the archive recorded them.
fn date_range(tweets: &[Tweet]) -> Option<DateRange> {
    let first = tweets.first()?;
    let last = tweets.last()?;
    Some(DateRange {
        start: first.created_at.date(),
        end: last.created_at.date(),
    })
}
