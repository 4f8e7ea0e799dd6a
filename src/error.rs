//! Error types shared by every extraction stage.
//!
//! Each error names the [`Stage`] that produced it so callers can tell a
//! malformed mask apart from a failing detector or a missing artifact.

use std::fmt;

/// Boxed error returned by a detection collaborator.
pub type DetectorError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for geometry extraction.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Detect,
    Threshold,
    Clean,
    Sample,
    Store,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Detect => "detect",
            Self::Threshold => "threshold",
            Self::Clean => "clean",
            Self::Sample => "sample",
            Self::Store => "store",
        };
        f.write_str(name)
    }
}

/// Error types for geometry extraction and storage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input at {stage} stage: {message}")]
    InvalidInput { stage: Stage, message: String },

    #[error("geometry artifact not found: {geometry_type}/{key}")]
    NotFound { geometry_type: String, key: String },

    #[error("detection collaborator failed: {source}")]
    Collaborator {
        stage: Stage,
        #[source]
        source: DetectorError,
    },

    #[error("extraction failed at level {level} (resolution {resolution}): {source}")]
    Level {
        level: usize,
        resolution: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(stage: Stage, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            stage,
            message: message.into(),
        }
    }

    pub(crate) fn collaborator(source: impl Into<DetectorError>) -> Self {
        Self::Collaborator {
            stage: Stage::Detect,
            source: source.into(),
        }
    }

    /// Stage the error originated from, looking through level wrappers.
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidInput { stage, .. } | Self::Collaborator { stage, .. } => *stage,
            Self::Level { source, .. } => source.stage(),
            Self::NotFound { .. } | Self::Io(_) | Self::Serialization(_) => Stage::Store,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(feature = "python")]
impl From<Error> for pyo3::PyErr {
    fn from(err: Error) -> Self {
        use pyo3::exceptions::{PyKeyError, PyRuntimeError, PyValueError};

        match &err {
            Error::InvalidInput { .. } => PyValueError::new_err(err.to_string()),
            Error::NotFound { .. } => PyKeyError::new_err(err.to_string()),
            Error::Level { source, .. } if matches!(**source, Error::InvalidInput { .. }) => {
                PyValueError::new_err(err.to_string())
            }
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_through_level_wrapper() {
        let inner = Error::invalid(Stage::Clean, "non-binary pixel");
        let err = Error::Level {
            level: 1,
            resolution: 768,
            source: Box::new(inner),
        };
        assert_eq!(err.stage(), Stage::Clean);
        assert!(err.to_string().contains("level 1"));
        assert!(err.to_string().contains("clean"));
    }

    #[test]
    fn test_collaborator_wraps_source() {
        let err = Error::collaborator("model offline");
        assert_eq!(err.stage(), Stage::Detect);
        assert!(err.to_string().contains("model offline"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
