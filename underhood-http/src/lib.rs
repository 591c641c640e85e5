//! Small HTTP client for the document service and the redirect script.
//!
//! - JSON and plain-text bodies (the redirect script is JavaScript, not JSON)
//! - Bearer tokens are sanitized before use and never logged
//! - Retries 429/5xx and network errors with exponential backoff and
//!   `Retry-After` support
//! - Optional *raw* request/response logging via `UNDERHOOD_HTTP_RAW=1`
//!
//! ```no_run
//! # async fn demo() -> Result<(), underhood_http::HttpError> {
//! let client = underhood_http::HttpClient::new("https://docs.example.com/api/")?;
//! let got: serde_json::Value = client
//!     .get_json("pages", underhood_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Callers that apply their own retry policy (see `underhood-publish`) build
//! the client with `with_retries(0)` and use [`HttpError::is_transient`] to
//! classify failures.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "UNDERHOOD_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let shown = if *k == AUTHORIZATION {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("<binary>").to_string()
            };
            (k.as_str().to_string(), shown)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// Whether repeating the same request may succeed: network failures,
    /// rate limiting and server-side errors.
    ///
    /// ```
    /// use underhood_http::HttpError;
    /// use reqwest::StatusCode;
    ///
    /// let busy = HttpError::Api {
    ///     status: StatusCode::SERVICE_UNAVAILABLE,
    ///     message: "busy".into(),
    ///     request_id: "-".into(),
    /// };
    /// assert!(busy.is_transient());
    /// assert!(!HttpError::Url("nope".into()).is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::Network(_) => true,
            HttpError::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            HttpError::Url(_) | HttpError::Build(_) | HttpError::Decode(..) => false,
        }
    }
}

/// Per-request overrides.
///
/// ```
/// use underhood_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     bearer: Some("token"),
///     ..Default::default()
/// };
/// assert!(opts.retries.is_none());
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    /// Sent as `Authorization: Bearer <token>`.
    pub bearer: Option<&'a str>,
}

struct Payload<'b> {
    content_type: &'b str,
    bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL. Request paths are joined
    /// onto it, so a base meant as a directory needs its trailing `/`.
    ///
    /// ```no_run
    /// use underhood_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://docs.example.com/api/")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(client.max_retries, 2);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// GET and decode a JSON response.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let (req_id, bytes) = self.execute(Method::GET, path, None, opts).await?;
        decode_json(&req_id, &bytes)
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = json_payload(body)?;
        let (req_id, bytes) = self
            .execute(Method::POST, path, Some(payload), opts)
            .await?;
        decode_json(&req_id, &bytes)
    }

    /// POST a JSON body, ignoring whatever the server answers with on success.
    pub async fn post_json_discard<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<(), HttpError>
    where
        B: Serialize + ?Sized,
    {
        let payload = json_payload(body)?;
        self.execute(Method::POST, path, Some(payload), opts).await?;
        Ok(())
    }

    /// GET a UTF-8 text response.
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let (_, bytes) = self.execute(Method::GET, path, None, opts).await?;
        decode_text(&bytes)
    }

    /// PUT a text body with the given content type; the response body is discarded.
    pub async fn put_text(
        &self,
        path: &str,
        content_type: &str,
        body: &str,
        opts: RequestOpts<'_>,
    ) -> Result<(), HttpError> {
        let payload = Payload {
            content_type,
            bytes: body.as_bytes().to_vec(),
        };
        self.execute(Method::PUT, path, Some(payload), opts).await?;
        Ok(())
    }

    /// Send with retries; returns the request id and the body of a 2xx response.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        payload: Option<Payload<'_>>,
        opts: RequestOpts<'_>,
    ) -> Result<(String, Vec<u8>), HttpError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let bearer = opts.bearer.map(sanitize_token).transpose()?;

        let mut attempt = 0usize;
        loop {
            let req_id = format!("r{}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed));

            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);
            if let Some(p) = &payload {
                rb = rb.header(CONTENT_TYPE, p.content_type).body(p.bytes.clone());
            }
            if let Some(token) = &bearer {
                rb = rb.bearer_auth(token);
            }
            let request = rb.build().map_err(|e| HttpError::Build(e.to_string()))?;

            tracing::debug!(
                req_id=%req_id,
                attempt=attempt + 1,
                max_retries,
                method=%method,
                host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                timeout_ms=timeout.as_millis() as u64,
                bearer=bearer.is_some(),
                has_body=%payload.is_some(),
                "http.request.start"
            );
            if raw_enabled() {
                let body = payload.as_ref().map(|p| {
                    String::from_utf8_lossy(truncate(&p.bytes, RAW_MAX_BODY)).into_owned()
                });
                let headers = redact_headers(request.headers());
                tracing::debug!(target: "http.raw", %req_id, %url, ?headers, ?body, "request");
            }

            let started = Instant::now();
            let sent = match self.inner.execute(request).await {
                Ok(resp) => {
                    let status = resp.status();
                    let headers = resp.headers().clone();
                    resp.bytes().await.map(|b| (status, headers, b.to_vec()))
                }
                Err(err) => Err(err),
            };

            let (status, headers, bytes) = match sent {
                Ok(parts) => parts,
                Err(err) => {
                    let message = err.to_string();
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff(attempt);
                        tracing::warn!(
                            req_id=%req_id,
                            attempt,
                            max_retries,
                            backoff_ms=delay.as_millis() as u64,
                            message=%message,
                            "http.retrying.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(req_id=%req_id, attempt, message=%message, "http.network_error");
                    return Err(HttpError::Network(message));
                }
            };

            let request_id = headers
                .get("x-request-id")
                .or_else(|| headers.get("x-correlation-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();

            tracing::debug!(
                req_id=%req_id,
                %status,
                duration_ms=started.elapsed().as_millis() as u64,
                body_len=bytes.len(),
                x_request_id=%request_id,
                "http.response.headers"
            );
            if raw_enabled() {
                let text = String::from_utf8_lossy(truncate(&bytes, RAW_MAX_BODY));
                let truncated = bytes.len() > RAW_MAX_BODY;
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    status=%status,
                    headers=?redact_headers(&headers),
                    body=%text,
                    truncated
                );
            }

            if status.is_success() {
                return Ok((req_id, bytes));
            }

            let message = extract_error_message(&bytes);
            let snippet = snip_body(&bytes);
            let is_429 = status == StatusCode::TOO_MANY_REQUESTS;

            if (is_429 || status.is_server_error()) && attempt < max_retries {
                attempt += 1;
                let delay = match retry_after_delay_secs(&headers) {
                    Some(secs) => Duration::from_secs(secs),
                    None if is_429 => backoff(attempt).max(Duration::from_millis(1100)),
                    None => backoff(attempt),
                };
                tracing::warn!(
                    req_id=%req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms=delay.as_millis() as u64,
                    message=%message,
                    body_snippet=%snippet,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id=%req_id,
                %status,
                message=%message,
                x_request_id=%request_id,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id,
            });
        }
    }
}

fn json_payload<B: Serialize + ?Sized>(body: &B) -> Result<Payload<'static>, HttpError> {
    let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
    Ok(Payload {
        content_type: "application/json",
        bytes,
    })
}

fn decode_json<T: DeserializeOwned>(req_id: &str, bytes: &[u8]) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(bytes).map_err(|e| {
        let snippet = snip_body(bytes);
        tracing::warn!(
            req_id=%req_id,
            serde_line=%e.line(),
            serde_col=%e.column(),
            serde_err=%e,
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

fn decode_text(bytes: &[u8]) -> Result<String, HttpError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| HttpError::Decode(e.to_string(), snip_body(bytes)))
}

fn backoff(attempt: usize) -> Duration {
    let shift = attempt.saturating_sub(1).min(16) as u32;
    Duration::from_millis(200u64.saturating_mul(1u64 << shift))
}

fn truncate(bytes: &[u8], max: usize) -> &[u8] {
    &bytes[..bytes.len().min(max)]
}

/// Pull a human-readable message out of the common JSON error shapes:
/// `{"message"}`, `{"detail"}`, `{"error": "..."}`, `{"error": {"message"}}`
/// and `{"errors": [{"message"}]}`.
fn extract_error_message(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return snip_body(body);
    };
    let candidates = [
        value.pointer("/message"),
        value.pointer("/detail"),
        value.pointer("/error/message"),
        value.pointer("/error"),
        value.pointer("/errors/0/message"),
        value.pointer("/errors/0/detail"),
    ];
    candidates
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| snip_body(body))
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

/// Tokens pasted from config often carry quotes or stray whitespace.
fn sanitize_token(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() {
        return Err(HttpError::Build("token contains non-ASCII bytes".into()));
    }
    HeaderValue::from_str(&format!("Bearer {s}"))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
