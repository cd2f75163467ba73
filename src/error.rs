use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompareError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{origin}:{line}: {message}")]
    Format {
        origin: String,
        line: usize,
        message: String,
    },
    #[error("divergence requested between sequences without common frames")]
    DegenerateMetric,
    #[error("Error: {0}")]
    LapjvError(String),
    #[error("unknown association strategy: {0}")]
    UnknownStrategy(String),
    #[error("invalid value {value} for {name}: {reason}")]
    InvalidOption {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

impl CompareError {
    pub(crate) fn format(
        origin: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        CompareError::Format {
            origin: origin.into(),
            line,
            message: message.into(),
        }
    }
}

pub(crate) fn require_finite(name: &'static str, value: f64) -> Result<(), CompareError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CompareError::InvalidOption {
            name,
            value,
            reason: "must be finite",
        })
    }
}

/// Rejects zero, negative and non-finite values. NaN fails every comparison
/// and is rejected too.
pub(crate) fn require_positive(name: &'static str, value: f64) -> Result<(), CompareError> {
    require_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(CompareError::InvalidOption {
            name,
            value,
            reason: "must be positive",
        })
    }
}
