use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Anything here aborts the whole sweep.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A sweep is already running")]
    Busy,

    #[error("Sweep cancelled")]
    Cancelled,

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Other error: {0}")]
    Other(String),
}

impl SweepError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SweepError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

/// A page could not be rendered. Prunes that page's subtree only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("not an HTML document ({0})")]
    NotHtml(String),

    #[error("timed out")]
    Timeout,

    #[error("{0}")]
    Transport(String),
}

/// A single resource or audit request failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("timed out")]
    Timeout,

    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Transport(format!("connection failed: {}", e))
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl From<FetchError> for RenderError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Status(code) => RenderError::Status(code),
            FetchError::Timeout => RenderError::Timeout,
            FetchError::Transport(msg) => RenderError::Transport(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
