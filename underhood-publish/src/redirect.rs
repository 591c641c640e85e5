//! Redirect map kept inside an externally hosted script.
//!
//! The script holds a JavaScript object literal on a known line, e.g.
//! `const pages = {'alice':'alice-3f2a'};`. Registering a redirect fetches
//! the script, extends that line with one more pair and uploads the whole
//! text back.
use std::time::Duration;

use underhood_common::RetryPolicy;
use underhood_http::{HttpClient, RequestOpts};

use crate::error::PublishError;

pub const DEFAULT_LINE: usize = 10;
const SCRIPT_CONTENT_TYPE: &str = "application/javascript";

/// Append `'key':'value'` to the object literal closing on line `line`
/// (0-based). The line must end with `};`.
pub fn splice_redirect(
    script: &str,
    line: usize,
    key: &str,
    value: &str,
) -> Result<String, PublishError> {
    for part in [key, value] {
        if part.contains(['\'', '\\', '\n', '\r']) {
            return Err(PublishError::RedirectScript(format!(
                "{part:?} cannot be written into a quoted literal"
            )));
        }
    }

    let mut lines: Vec<String> = script.split('\n').map(str::to_owned).collect();
    let total = lines.len();
    let target = lines.get_mut(line).ok_or_else(|| {
        PublishError::RedirectScript(format!("script has {total} lines, no line {line}"))
    })?;
    let head = target.trim_end().strip_suffix("};").ok_or_else(|| {
        PublishError::RedirectScript(format!("line {line} does not end with '}};': {target:?}"))
    })?;
    let sep = if head.trim_end().ends_with('{') { "" } else { ", " };
    *target = format!("{head}{sep}'{key}':'{value}'}};");
    Ok(lines.join("\n"))
}

/// Client for the hosted script that maps usernames to page slugs.
pub struct RedirectScript {
    client: HttpClient,
    token: String,
    line: usize,
    policy: RetryPolicy,
}

impl RedirectScript {
    pub fn new(
        script_url: &str,
        token: impl Into<String>,
        line: usize,
        policy: RetryPolicy,
    ) -> Result<Self, PublishError> {
        let client = HttpClient::new(script_url)?
            .with_timeout(Duration::from_secs(30))
            .with_retries(0);
        Ok(Self {
            client,
            token: token.into(),
            line,
            policy,
        })
    }

    fn opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            bearer: Some(&self.token),
            ..Default::default()
        }
    }

    /// Add `key -> value` to the map and upload the new script.
    pub async fn register(&self, key: &str, value: &str) -> Result<(), PublishError> {
        let this = self;
        let script = self
            .policy
            .run("redirect.fetch", PublishError::is_transient, move || async move {
                this.client
                    .get_text("", this.opts())
                    .await
                    .map_err(PublishError::from)
            })
            .await?;

        let updated = splice_redirect(&script, self.line, key, value)?;
        let body = updated.as_str();
        self.policy
            .run("redirect.upload", PublishError::is_transient, move || async move {
                this.client
                    .put_text("", SCRIPT_CONTENT_TYPE, body, this.opts())
                    .await
                    .map_err(PublishError::from)
            })
            .await?;

        tracing::info!(key, value, url = %self.client.base(), "redirect.registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(map_line: &str) -> String {
        let mut lines: Vec<String> = (0..10).map(|i| format!("// {i}")).collect();
        lines.push(map_line.to_string());
        lines.push("addEventListener('fetch', e => e.respondWith(route(e.request)));".into());
        lines.join("\n")
    }

    #[test]
    fn appends_pair_to_existing_map() {
        let map = script("const pages = {'bob':'bob-1'};");
        let out = splice_redirect(&map, DEFAULT_LINE, "alice", "alice-2").unwrap();
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines[10], "const pages = {'bob':'bob-1', 'alice':'alice-2'};");
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "// 0");
    }

    #[test]
    fn empty_map_gets_no_leading_comma() {
        let map = script("const pages = {};");
        let out = splice_redirect(&map, DEFAULT_LINE, "alice", "a1").unwrap();
        assert_eq!(out.split('\n').nth(10), Some("const pages = {'alice':'a1'};"));
    }

    #[test]
    fn missing_line_is_an_error() {
        let err = splice_redirect("const pages = {};", DEFAULT_LINE, "alice", "a1").unwrap_err();
        assert!(matches!(err, PublishError::RedirectScript(_)));
    }

    #[test]
    fn line_must_close_the_map() {
        let map = script("const pages = {");
        let err = splice_redirect(&map, DEFAULT_LINE, "alice", "a1").unwrap_err();
        assert!(matches!(err, PublishError::RedirectScript(_)));
    }

    #[test]
    fn quotes_are_rejected() {
        let map = script("const pages = {};");
        let err = splice_redirect(&map, DEFAULT_LINE, "o'neil", "x").unwrap_err();
        assert!(matches!(err, PublishError::RedirectScript(_)));
    }
}
