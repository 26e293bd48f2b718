//! Error types shared by the constellation builder and the sweep sampler.

use std::time::Duration;
use thiserror::Error;

/// Errors raised while building a [`crate::constellation::ConstellationSpec`].
///
/// These only occur at construction time; a built spec never fails afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstellationError {
    #[error("invalid constellation: {0}")]
    InvalidConstellation(String),

    #[error("invalid sector layout: {0}")]
    InvalidSectorLayout(String),
}

/// Configuration problems detected before any streaming starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown channel type '{0}'")]
    UnknownChannel(String),

    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("unknown modulation '{0}'")]
    UnknownModulation(String),

    #[error("invalid SNR list '{0}'")]
    InvalidSnrList(String),

    #[error(
        "{num_exemplars} windows of {window_len} samples need up to \
         {required} samples, capture holds {capacity}"
    )]
    WindowsExceedCapture {
        window_len: usize,
        num_exemplars: usize,
        required: usize,
        capacity: usize,
    },

    #[error("invalid sampler parameter: {0}")]
    InvalidSampler(String),
}

/// Failures local to a single sweep job (or a single window inside it).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SweepError {
    #[error("capture stalled at {captured}/{capacity} samples after {waited:?}")]
    CaptureTimeout {
        captured: usize,
        capacity: usize,
        waited: Duration,
    },

    #[error("window at offset {offset} has zero energy")]
    ZeroEnergyWindow { offset: usize },

    #[error("job cancelled after {captured} samples")]
    Cancelled { captured: usize },

    #[error("sample stream closed at {captured}/{capacity} samples")]
    StreamClosed { captured: usize, capacity: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Constellation(#[from] ConstellationError),
}

pub type SweepResult<T> = Result<T, SweepError>;

/// Failures while assembling or persisting a [`crate::dataset::Dataset`].
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("exemplar has {found} samples, dataset windows are {expected}")]
    WindowMismatch { expected: usize, found: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
