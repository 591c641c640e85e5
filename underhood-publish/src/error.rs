use std::path::PathBuf;

use underhood_http::HttpError;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode page metadata: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to encode block: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown page {0}")]
    UnknownPage(String),
    #[error("redirect script: {0}")]
    RedirectScript(String),
}

impl PublishError {
    /// Only transport failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            PublishError::Http(e) => e.is_transient(),
            _ => false,
        }
    }
}
