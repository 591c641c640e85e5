//! Turn a parsed tweet's entities into inline Markdown.
//!
//! Replacement is plain substring substitution over the text: the archive
//! entities carry no offsets we rely on, so every occurrence of a short URL,
//! `@mention` or `#hashtag` is replaced. Rewriting is single-pass; running it
//! again on its own output would wrap mentions and hashtags a second time.
use url::Url;

use crate::twitter::parse::Tweet;

const PHOTO: &str = "photo";
const IMAGE_EXTENSIONS: [&str; 3] = [".png", ".jpg", ".jpeg"];

/// A rewritten tweet plus the external links it referenced, in order of
/// discovery. Duplicates are kept here; the document dedups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub tweet: Tweet,
    pub links: Vec<String>,
}

impl Tweet {
    /// Rewrite entities into Markdown, collecting images and external links.
    ///
    /// Ignored tweets come back unchanged with no links. Order matters and is
    /// fixed: photo media, link entities, mentions, hashtags, then the quote's
    /// link entities.
    pub fn rewrite(self) -> Rewritten {
        let mut tweet = self;
        let mut links = Vec::new();
        if tweet.ignore {
            return Rewritten { tweet, links };
        }

        for media in tweet.media.iter().filter(|m| m.kind == PHOTO) {
            tweet.images.push(media.resolved_url.clone());
            tweet.text = tweet.text.replace(&media.short_url, "");
        }

        for url in &tweet.urls {
            if is_image_url(&url.resolved_url) {
                tweet.images.push(url.resolved_url.clone());
            } else if !is_status_permalink(&url.resolved_url) {
                links.push(url.resolved_url.clone());
            }
            tweet.text = tweet
                .text
                .replace(&url.short_url, &md_link(&url.display_text, &url.resolved_url));
        }

        for name in &tweet.mentions {
            let mention = format!("@{name}");
            let target = format!("https://twitter.com/{name}");
            tweet.text = tweet.text.replace(&mention, &md_link(&mention, &target));
        }

        for tag in &tweet.hashtags {
            let hashtag = format!("#{tag}");
            let target = format!("https://twitter.com/search?q=%23{tag}");
            tweet.text = tweet.text.replace(&hashtag, &md_link(&hashtag, &target));
        }

        if let Some(quote) = tweet.quote.as_mut() {
            for url in &tweet.quote_urls {
                let link = md_link(&url.display_text, &url.resolved_url);
                *quote = quote.replace(&url.short_url, &link);
            }
        }

        tracing::trace!(
            id = %tweet.id,
            images = tweet.images.len(),
            links = links.len(),
            "tweet.rewritten"
        );
        Rewritten { tweet, links }
    }
}

/// Free-function form of [`Tweet::rewrite`].
pub fn rewrite(tweet: Tweet) -> Rewritten {
    tweet.rewrite()
}

fn md_link(label: &str, target: &str) -> String {
    format!("[{label}]({target})")
}

/// Resolved URL points at a PNG or JPEG. Only the path is considered, so
/// query strings and fragments don't hide the extension. Case-sensitive.
pub fn is_image_url(resolved: &str) -> bool {
    match Url::parse(resolved) {
        Ok(url) => has_image_extension(url.path()),
        Err(_) => has_image_extension(resolved),
    }
}

fn has_image_extension(s: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| s.ends_with(ext))
}

/// Links back to a tweet are not collected as external links.
pub fn is_status_permalink(resolved: &str) -> bool {
    resolved.contains("twitter.com") && resolved.contains("status")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitter::parse::{TweetMedia, TweetUrl};
    use time::OffsetDateTime;

    fn tweet(text: &str) -> Tweet {
        Tweet {
            id: "1".into(),
            ignore: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            date: OffsetDateTime::UNIX_EPOCH,
            text: text.into(),
            quote: None,
            urls: Vec::new(),
            quote_urls: Vec::new(),
            media: Vec::new(),
            mentions: Vec::new(),
            hashtags: Vec::new(),
            images: Vec::new(),
        }
    }

    fn url(short: &str, display: &str, resolved: &str) -> TweetUrl {
        TweetUrl {
            short_url: short.into(),
            display_text: display.into(),
            resolved_url: resolved.into(),
        }
    }

    #[test]
    fn rewrites_links_mentions_and_hashtags() {
        let mut t = tweet("Check this @bob #news https://t.co/x");
        t.mentions = vec!["bob".into()];
        t.hashtags = vec!["news".into()];
        t.urls = vec![url("https://t.co/x", "ex.com/a", "https://ex.com/a")];

        let out = t.rewrite();
        assert_eq!(
            out.tweet.text,
            "Check this [@bob](https://twitter.com/bob) [#news](https://twitter.com/search?q=%23news) [ex.com/a](https://ex.com/a)"
        );
        assert_eq!(out.links, vec!["https://ex.com/a"]);
        assert!(out.tweet.images.is_empty());
    }

    #[test]
    fn second_pass_only_leaves_short_urls_alone() {
        let mut t = tweet("Check this @bob #news https://t.co/x");
        t.mentions = vec!["bob".into()];
        t.hashtags = vec!["news".into()];
        t.urls = vec![url("https://t.co/x", "example.com/a", "https://example.com/a")];

        let once = t.rewrite();
        let twice = once.tweet.clone().rewrite();

        let link = "[example.com/a](https://example.com/a)";
        assert!(once.tweet.text.ends_with(link));
        assert!(twice.tweet.text.ends_with(link));
        assert!(!twice.tweet.text.contains("https://t.co/x"));
        assert_eq!(
            twice.tweet.text,
            "Check this [[@bob](https://twitter.com/bob)](https://twitter.com/bob) \
             [[#news](https://twitter.com/search?q=%23news)](https://twitter.com/search?q=%23news) \
             [example.com/a](https://example.com/a)"
        );
        // Entities are still listed, so the link is reported again.
        assert_eq!(twice.links, once.links);
    }

    #[test]
    fn image_urls_become_images_not_links() {
        let mut t = tweet("pic https://t.co/i");
        t.urls = vec![url("https://t.co/i", "ex.com/a.png", "https://ex.com/a.png?w=200")];

        let out = t.rewrite();
        assert_eq!(out.tweet.images, vec!["https://ex.com/a.png?w=200"]);
        assert!(out.links.is_empty());
        assert_eq!(out.tweet.text, "pic [ex.com/a.png](https://ex.com/a.png?w=200)");
    }

    #[test]
    fn status_permalinks_are_neither_images_nor_links() {
        let mut t = tweet("see https://t.co/s");
        t.urls = vec![url(
            "https://t.co/s",
            "twitter.com/bob/status/1",
            "https://twitter.com/bob/status/1",
        )];

        let out = t.rewrite();
        assert!(out.links.is_empty());
        assert!(out.tweet.images.is_empty());
        assert_eq!(
            out.tweet.text,
            "see [twitter.com/bob/status/1](https://twitter.com/bob/status/1)"
        );
    }

    #[test]
    fn photos_are_extracted_and_stripped() {
        let mut t = tweet("https://t.co/p");
        t.media = vec![
            TweetMedia {
                kind: "photo".into(),
                short_url: "https://t.co/p".into(),
                resolved_url: "https://pbs.twimg.com/media/p.jpg".into(),
            },
            TweetMedia {
                kind: "video".into(),
                short_url: "https://t.co/v".into(),
                resolved_url: "https://video.twimg.com/v.mp4".into(),
            },
        ];

        let out = t.rewrite();
        assert_eq!(out.tweet.text, "");
        assert_eq!(out.tweet.images, vec!["https://pbs.twimg.com/media/p.jpg"]);
    }

    #[test]
    fn image_extension_check_is_case_sensitive_and_path_based() {
        assert!(is_image_url("https://ex.com/a.jpeg"));
        assert!(is_image_url("https://ex.com/a.jpg#frag"));
        assert!(!is_image_url("https://ex.com/a.JPG"));
        assert!(!is_image_url("https://ex.com/a.gif"));
        assert!(!is_image_url("https://ex.com/?file=a.txt"));
        assert!(is_image_url("not a url.png"));
    }

    #[test]
    fn quote_urls_are_rewritten_without_collecting() {
        let mut t = tweet("agreed");
        t.quote = Some("read https://t.co/q".into());
        t.quote_urls = vec![url("https://t.co/q", "q.example", "https://q.example/")];

        let out = t.rewrite();
        assert_eq!(out.tweet.quote.as_deref(), Some("read [q.example](https://q.example/)"));
        assert!(out.links.is_empty());
        assert!(out.tweet.images.is_empty());
    }

    #[test]
    fn ignored_tweets_are_untouched() {
        let mut t = tweet("@alice https://t.co/x");
        t.ignore = true;
        t.mentions = vec!["alice".into()];
        t.urls = vec![url("https://t.co/x", "ex.com", "https://ex.com")];
        let before = t.clone();

        let out = rewrite(t);
        assert_eq!(out.tweet, before);
        assert!(out.links.is_empty());
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let mut t = tweet("#a and #a again, #ab too");
        t.hashtags = vec!["a".into()];

        let out = t.rewrite();
        assert_eq!(
            out.tweet.text,
            "[#a](https://twitter.com/search?q=%23a) and [#a](https://twitter.com/search?q=%23a) again, [#a](https://twitter.com/search?q=%23a)b too"
        );
    }

    #[test]
    fn duplicate_links_are_kept_in_discovery_order() {
        let mut t = tweet("https://t.co/1 https://t.co/2 https://t.co/3");
        t.urls = vec![
            url("https://t.co/1", "b.example", "https://b.example/"),
            url("https://t.co/2", "a.example", "https://a.example/"),
            url("https://t.co/3", "b.example", "https://b.example/"),
        ];

        let out = t.rewrite();
        assert_eq!(
            out.links,
            vec!["https://b.example/", "https://a.example/", "https://b.example/"]
        );
    }
}
