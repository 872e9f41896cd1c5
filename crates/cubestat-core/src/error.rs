//! Error type shared by every cubestat component.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CubestatError {
    /// One malformed record or poll result. Dropped by the ingestion loop.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The metric source kept failing; ingestion gave up.
    #[error("metric source failed {count} times in a row (last error: {last})")]
    TooManyFailures { count: usize, last: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CubestatError {
    /// Errors the ingestion loop drops and counts instead of propagating.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

impl From<plist::Error> for CubestatError {
    fn from(err: plist::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T, E = CubestatError> = std::result::Result<T, E>;
