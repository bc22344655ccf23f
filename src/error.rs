use thiserror::Error;

/// Errors produced by the word-frequency pipeline and its input sources.
#[derive(Error, Debug)]
pub enum WordFreqError {
    #[error("HTTP error: {0}")]
    Http(Box<reqwest::Error>),

    #[error("request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("invalid URL '{input}': {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("invalid CSS selector: {0}")]
    Selector(String),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("malformed export payload: {0}")]
    Export(String),

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
}

impl From<reqwest::Error> for WordFreqError {
    fn from(error: reqwest::Error) -> Self {
        WordFreqError::Http(Box::new(error))
    }
}

impl From<std::io::Error> for WordFreqError {
    fn from(error: std::io::Error) -> Self {
        WordFreqError::Io(Box::new(error))
    }
}

pub type Result<T> = std::result::Result<T, WordFreqError>;
