//! Loader for `underhood.yaml` with environment overlays.
//!
//! Sources are merged in the order they are added, then
//! `UNDERHOOD_`-prefixed environment variables win (`__` separates nested
//! keys, e.g. `UNDERHOOD_PUBLISH__RETRY__DELAY_MS=100`). Finally `${VAR}`
//! placeholders inside string values are expanded. Environment values stay
//! strings until the typed structs are built, so a numeric-looking token is
//! still a valid `String` field. Every section is
//! optional; an empty configuration yields the Russian week-archive labels,
//! a Markdown sink under `out/`, and no redirect registration.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use underhood_common::RetryPolicy;
use underhood_common::observability::{LogConfig, LogFormat};
use underhood_document::{DEFAULT_DAYS, DEFAULT_LINKS_TITLE, DEFAULT_OFFSET, DEFAULT_WEEK_TITLE};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct UnderhoodConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub redirects: Option<RedirectConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Display strings and the fixed timezone applied to every timestamp.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub week_title: String,
    pub links_title: String,
    /// Weekday names, Monday first.
    pub days: Vec<String>,
    pub utc_offset_minutes: i32,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            week_title: DEFAULT_WEEK_TITLE.into(),
            links_title: DEFAULT_LINKS_TITLE.into(),
            days: DEFAULT_DAYS.map(String::from).to_vec(),
            utc_offset_minutes: DEFAULT_OFFSET.whole_minutes().into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// The tag is `kind`; the remaining keys belong to the chosen sink.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    Markdown {
        #[serde(default = "default_markdown_dir")]
        dir: PathBuf,
    },
    Http {
        endpoint: String,
        auth_token: String,
        #[serde(
            default = "default_http_timeout_secs",
            deserialize_with = "u64_or_string"
        )]
        timeout_secs: u64,
    },
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Markdown {
            dir: default_markdown_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// `None` keeps retrying transient failures forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.delay_ms);
        match self.max_attempts {
            Some(max) => RetryPolicy::bounded(max, delay),
            None => RetryPolicy::unbounded(delay),
        }
    }
}

/// Where the `username -> page slug` redirect map lives.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectConfig {
    pub script_url: String,
    pub auth_token: String,
    /// Zero-based line of the script holding the map literal.
    #[serde(default = "default_redirect_line")]
    pub line: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: true,
            filter: "info".into(),
            dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
            ..LogConfig::default()
        }
    }
}

fn default_markdown_dir() -> PathBuf {
    PathBuf::from("out")
}
fn default_http_timeout_secs() -> u64 {
    30
}
fn default_retry_delay_ms() -> u64 {
    5_000
}
fn default_redirect_line() -> usize {
    10
}

/// Fields inside the tagged sink are buffered before they reach the `config`
/// deserializer, so its string-to-number conversion does not apply there.
fn u64_or_string<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }
    match Raw::deserialize(de)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct UnderhoodConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for UnderhoodConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl UnderhoodConfigLoader {
    /// Start with no files and `UNDERHOOD_` env overrides.
    ///
    /// ```
    /// use underhood_config::{SinkConfig, UnderhoodConfigLoader};
    ///
    /// let config = UnderhoodConfigLoader::new().load().expect("defaults load");
    ///
    /// assert_eq!(config.labels.days.len(), 7);
    /// assert_eq!(config.labels.utc_offset_minutes, 180);
    /// assert!(matches!(config.publish.sink, SinkConfig::Markdown { .. }));
    /// assert!(config.redirects.is_none());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`Self::with_file`], but a missing file is skipped so the
    /// binary can run purely on defaults and environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use underhood_config::UnderhoodConfigLoader;
    ///
    /// let cfg = UnderhoodConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "test"
    /// labels:
    ///   week_title: "Week archive"
    ///   links_title: "Links"
    ///   days: [Monday, Tuesday, Wednesday, Thursday, Friday, Saturday, Sunday]
    ///   utc_offset_minutes: -300
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.version.as_deref(), Some("test"));
    /// assert_eq!(cfg.labels.days[0], "Monday");
    /// assert_eq!(cfg.labels.utc_offset_minutes, -300);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `${VAR}` placeholders are expanded before the typed structs are built.
    ///
    /// ```
    /// use underhood_config::{SinkConfig, UnderhoodConfigLoader};
    ///
    /// unsafe { std::env::set_var("DOCS_TOKEN", "injected-from-env"); }
    ///
    /// let config = UnderhoodConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// publish:
    ///   sink:
    ///     kind: http
    ///     endpoint: "https://docs.example.com/api/"
    ///     auth_token: "${DOCS_TOKEN}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// match &config.publish.sink {
    ///     SinkConfig::Http { endpoint, auth_token, timeout_secs } => {
    ///         assert_eq!(endpoint, "https://docs.example.com/api/");
    ///         assert_eq!(auth_token, "injected-from-env");
    ///         assert_eq!(*timeout_secs, 30);
    ///     }
    ///     _ => panic!("expected an HTTP sink"),
    /// }
    ///
    /// unsafe { std::env::remove_var("DOCS_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<UnderhoodConfig, ConfigError> {
        // Environment goes last so it overrides every file and snippet.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("UNDERHOOD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        // Round-trip through `config` so "100" can still fill a u64 field.
        Config::try_from(&v)?.try_deserialize()
    }
}
