use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the library; binaries wrap these in `eyre::Report`.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("invalid {field}: {value:?} ({reason})")]
    Input {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{} is missing required columns: {missing:?}", path.display())]
    MissingColumns { path: PathBuf, missing: Vec<String> },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Gemini API key is not configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest_middleware::Error),

    #[error("Gemini API returned an unusable response: {0}")]
    Api(String),
}

impl DashboardError {
    pub fn input(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Input {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv { path: path.into(), source }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(reqwest_middleware::Error::Reqwest(e))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
