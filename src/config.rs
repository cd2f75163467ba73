use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    association::{Strategy, ThresholdParams, MAX_DIVERGENCE},
    error::{require_positive, CompareError},
};

/// Options for one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    /// Report differing first/last frames of matched pairs
    pub check_frames: bool,
    /// Report every per-frame distance above `epsilon`
    pub warn_pointwise: bool,
    /// Report trajectories without a counterpart
    pub check_counterpart: bool,
    /// Tolerated per-frame distance in pixels
    pub epsilon: f64,
    /// Divergence at and above which no strategy pairs two trajectories
    pub max_divergence: f64,
    pub strategy: Strategy,
    /// Only used by [`Strategy::Threshold`]
    pub threshold: ThresholdParams,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            check_frames: false,
            warn_pointwise: false,
            check_counterpart: false,
            epsilon: 1.0,
            max_divergence: MAX_DIVERGENCE,
            strategy: Strategy::default(),
            threshold: ThresholdParams::default(),
        }
    }
}

impl CompareOptions {
    /// All diagnostics on, as the interactive viewer needs them.
    pub fn all_checks() -> Self {
        Self {
            check_frames: true,
            warn_pointwise: true,
            check_counterpart: true,
            ..Self::default()
        }
    }

    /// Rejects values a run cannot complete with.
    pub fn validate(&self) -> Result<(), CompareError> {
        require_positive("epsilon", self.epsilon)?;
        require_positive("max_divergence", self.max_divergence)?;
        self.threshold.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self, CompareError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CompareError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CompareError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}
