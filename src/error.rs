use thiserror::Error;

use crate::nnet::NetworkError;

/// Coarse classification of [`DecodableError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad construction-time input: options, priors, transition tables.
    Config,
    /// The caller asked for a frame or index that does not exist.
    OutOfRange,
    /// The network forward pass failed or produced an unusable batch.
    UpstreamCompute,
}

/// Unified decodable errors.
#[derive(Error, Debug)]
pub enum DecodableError {
    #[error("Log-prior dimension {priors} does not match network output dimension {outputs}")]
    PriorDimMismatch { priors: usize, outputs: usize },

    #[error("Invalid option {name}: {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("Transition id {transition_id} maps to pdf {pdf}, but the network has {num_pdfs} outputs")]
    PdfOutOfRange {
        transition_id: usize,
        pdf: usize,
        num_pdfs: usize,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame {frame} requested but only {ready} frames are ready")]
    FrameOutOfRange { frame: usize, ready: usize },

    #[error("Transition id {index} outside [1, {num_indices}]")]
    IndexOutOfRange { index: usize, num_indices: usize },

    #[error("Frame {frame} is not in the cached window [{begin}, {end})")]
    NotCached { frame: usize, begin: usize, end: usize },

    #[error("Output index {index} outside [0, {num_outputs})")]
    OutputOutOfRange { index: usize, num_outputs: usize },

    #[error("Frame buffer has length {actual}, expected feature dimension {expected}")]
    BufferDimMismatch { expected: usize, actual: usize },

    #[error("Network: {0}")]
    Network(#[from] NetworkError),

    #[error("Network returned {rows}x{cols} for a batch expecting {expected_rows}x{expected_cols}")]
    MalformedOutput {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },

    #[error("Network output {value} at row {row}, column {col} is not a finite probability")]
    NonFiniteOutput { row: usize, col: usize, value: f32 },
}

impl DecodableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PriorDimMismatch { .. }
            | Self::InvalidOption { .. }
            | Self::PdfOutOfRange { .. }
            | Self::Parse(_)
            | Self::Io(_)
            | Self::BufferDimMismatch { .. } => ErrorKind::Config,
            Self::FrameOutOfRange { .. }
            | Self::IndexOutOfRange { .. }
            | Self::NotCached { .. }
            | Self::OutputOutOfRange { .. } => ErrorKind::OutOfRange,
            Self::Network(_) | Self::MalformedOutput { .. } | Self::NonFiniteOutput { .. } => {
                ErrorKind::UpstreamCompute
            }
        }
    }

    pub(crate) fn invalid_option(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
