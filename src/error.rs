use thiserror::Error;

/// Errors raised by the engine
///
/// Validation problems are never errors; they are recorded as issues against
/// a page. These variants cover configuration, collaborator and per-page
/// processing failures.
#[derive(Debug, Error)]
pub enum SeoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("duplicate page URL in corpus: {0}")]
    DuplicateUrl(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("performance probe failed for {url}: {message}")]
    Probe { url: String, message: String },

    #[error("run aborted")]
    Aborted,

    #[error("page task failed: {0}")]
    Task(String),
}

impl SeoError {
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SeoError>;
