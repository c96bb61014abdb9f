//! The acoustic network seam and its ONNX Runtime implementation.

use std::ops::Range;

use ndarray::{Array2, ArrayView2, Axis};

mod onnx;

pub use onnx::{OrtNetwork, OrtNetworkConfig};

#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),
    #[error("ndarray shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Model input not found: {0}")]
    InputNotFound(String),
    #[error("Model output not found: {0}")]
    OutputNotFound(String),
    #[error("Output dimension of the model is not known; set it explicitly")]
    UnknownOutputDim,
    #[error("Backend error: {0}")]
    Backend(String),
}

/// The black-box acoustic model: a batch of feature rows in, one output
/// distribution (probabilities over pdfs) per row out.
pub trait Network {
    /// Number of pdfs, i.e. the width of every output row.
    fn output_dim(&self) -> usize;

    fn forward(&mut self, frames: ArrayView2<'_, f32>) -> Result<Array2<f32>, NetworkError>;

    /// Produces one output row per group, where `groups[i]` is a range of
    /// rows in `frames`. Used by split skip decoding.
    ///
    /// The default runs `forward` once over all rows and averages the
    /// output distributions within each group.
    fn forward_grouped(
        &mut self,
        frames: ArrayView2<'_, f32>,
        groups: &[Range<usize>],
    ) -> Result<Array2<f32>, NetworkError> {
        let out = self.forward(frames)?;
        let mut pooled = Array2::zeros((groups.len(), out.ncols()));
        for (mut row, group) in pooled.outer_iter_mut().zip(groups) {
            if group.end > out.nrows() || group.is_empty() {
                return Err(NetworkError::Backend(format!(
                    "group {group:?} outside {} output rows",
                    out.nrows()
                )));
            }
            let mean = out
                .slice_axis(Axis(0), group.clone().into())
                .mean_axis(Axis(0))
                .ok_or_else(|| NetworkError::Backend("empty group".into()))?;
            row.assign(&mean);
        }
        Ok(pooled)
    }
}

impl<N: Network + ?Sized> Network for Box<N> {
    fn output_dim(&self) -> usize {
        (**self).output_dim()
    }

    fn forward(&mut self, frames: ArrayView2<'_, f32>) -> Result<Array2<f32>, NetworkError> {
        (**self).forward(frames)
    }

    fn forward_grouped(
        &mut self,
        frames: ArrayView2<'_, f32>,
        groups: &[Range<usize>],
    ) -> Result<Array2<f32>, NetworkError> {
        (**self).forward_grouped(frames, groups)
    }
}
