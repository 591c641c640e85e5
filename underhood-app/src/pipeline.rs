use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use underhood_config::{LabelsConfig, SinkConfig, UnderhoodConfig};
use underhood_document::{Author, Document, LocalizedLabels, build};
use underhood_publish::{DocumentSink, HttpDocumentSink, MarkdownSink, RedirectScript};
use underhood_social::twitter::types::ArchiveDump;

use crate::BuildArgs;

pub fn labels(cfg: &LabelsConfig) -> Result<LocalizedLabels> {
    LocalizedLabels::new(
        cfg.week_title.clone(),
        cfg.links_title.clone(),
        cfg.days.clone(),
        cfg.utc_offset_minutes,
    )
    .context("invalid labels configuration")
}

/// `dump/<author>-tweets.json` unless given explicitly.
pub fn archive_path(args: &BuildArgs) -> PathBuf {
    args.archive
        .clone()
        .unwrap_or_else(|| Path::new("dump").join(format!("{}-tweets.json", args.author)))
}

pub fn load_archive(path: &Path) -> Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading archive {}", path.display()))?;
    let dump: ArchiveDump = serde_json::from_str(&raw)
        .with_context(|| format!("parsing archive {}", path.display()))?;
    tracing::info!(path = %path.display(), records = dump.tweets.len(), "archive.loaded");
    Ok(dump.tweets)
}

pub fn build_document(cfg: &UnderhoodConfig, args: &BuildArgs) -> Result<Document> {
    let labels = labels(&cfg.labels)?;
    let tweets = load_archive(&archive_path(args))?;

    let mut author =
        Author::new(args.author.clone(), tweets).with_topics(args.topics.iter().cloned());
    if let Some(avatar) = &args.avatar {
        author = author.with_avatar(avatar.clone());
    }
    build(&author, &labels).with_context(|| format!("building document for @{}", args.author))
}

pub fn make_sink(cfg: &SinkConfig) -> Result<Box<dyn DocumentSink>> {
    Ok(match cfg {
        SinkConfig::Markdown { dir } => Box::new(MarkdownSink::new(dir.clone())),
        SinkConfig::Http {
            endpoint,
            auth_token,
            timeout_secs,
        } => Box::new(
            HttpDocumentSink::new(endpoint, auth_token.clone(), Duration::from_secs(*timeout_secs))
                .with_context(|| format!("document service endpoint {endpoint}"))?,
        ),
    })
}

/// Build and print the document as JSON.
pub fn render(cfg: &UnderhoodConfig, args: &BuildArgs) -> Result<()> {
    let document = build_document(cfg, args)?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

/// Build, publish through the configured sink, then register the redirect.
pub async fn publish(cfg: &UnderhoodConfig, args: &BuildArgs) -> Result<()> {
    let document = build_document(cfg, args)?;
    let policy = cfg.publish.retry.policy();
    let sink = make_sink(&cfg.publish.sink)?;

    let page = underhood_publish::publish(sink.as_ref(), &document, &policy)
        .await
        .context("publishing document")?;

    if let Some(redirects) = &cfg.redirects {
        RedirectScript::new(
            &redirects.script_url,
            redirects.auth_token.clone(),
            redirects.line,
            policy.clone(),
        )?
        .register(&args.author, &page.slug)
        .await
        .context("registering redirect")?;
    } else {
        tracing::debug!("redirects not configured; skipping");
    }

    println!("{}", page.url);
    Ok(())
}
