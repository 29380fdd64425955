use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PathwayError>;

#[derive(Debug, Error)]
pub enum PathwayError {
    /// Network or service failure while talking to KEGG.
    #[error("failed to fetch {target}: {message}")]
    Fetch { target: String, message: String },

    /// The pathway document is malformed or truncated.
    #[error("failed to parse pathway document: {0}")]
    Parse(String),

    #[error("cache error at {path:?}: {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to render page: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("failed to serialize graph data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[cfg(feature = "diagram")]
    #[error("failed to draw diagram: {0}")]
    Diagram(String),

    #[cfg(feature = "diagram")]
    #[error("cairo error: {0}")]
    Cairo(#[from] cairo::Error),
}

impl PathwayError {
    pub fn fetch(target: impl Into<String>, message: impl ToString) -> Self {
        Self::Fetch {
            target: target.into(),
            message: message.to_string(),
        }
    }
}
