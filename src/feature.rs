use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimMismatch { expected: usize, actual: usize },
    #[error("Input already finished; no more frames can be accepted")]
    InputFinished,
    #[error("ndarray shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// A source of feature frames whose frame count may grow over time.
///
/// Frames are immutable once produced. Callers must only request
/// `t < num_frames_ready()`.
pub trait OnlineFeature {
    fn dim(&self) -> usize;

    fn num_frames_ready(&self) -> usize;

    fn is_last_frame(&self, frame: usize) -> bool;

    fn get_frame(&self, t: usize, out: ArrayViewMut1<'_, f32>);
}

impl<F: OnlineFeature + ?Sized> OnlineFeature for &F {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn num_frames_ready(&self) -> usize {
        (**self).num_frames_ready()
    }

    fn is_last_frame(&self, frame: usize) -> bool {
        (**self).is_last_frame(frame)
    }

    fn get_frame(&self, t: usize, out: ArrayViewMut1<'_, f32>) {
        (**self).get_frame(t, out)
    }
}

impl<F: OnlineFeature + ?Sized> OnlineFeature for Box<F> {
    fn dim(&self) -> usize {
        (**self).dim()
    }

    fn num_frames_ready(&self) -> usize {
        (**self).num_frames_ready()
    }

    fn is_last_frame(&self, frame: usize) -> bool {
        (**self).is_last_frame(frame)
    }

    fn get_frame(&self, t: usize, out: ArrayViewMut1<'_, f32>) {
        (**self).get_frame(t, out)
    }
}

/// A complete feature matrix, one row per frame.
#[derive(Debug, Clone, Copy)]
pub struct MatrixFeature<'a> {
    feats: ArrayView2<'a, f32>,
}

impl<'a> MatrixFeature<'a> {
    pub fn new(feats: ArrayView2<'a, f32>) -> Self {
        Self { feats }
    }

    pub fn view(&self) -> ArrayView2<'a, f32> {
        self.feats
    }
}

impl OnlineFeature for MatrixFeature<'_> {
    fn dim(&self) -> usize {
        self.feats.ncols()
    }

    fn num_frames_ready(&self) -> usize {
        self.feats.nrows()
    }

    fn is_last_frame(&self, frame: usize) -> bool {
        frame + 1 == self.feats.nrows()
    }

    fn get_frame(&self, t: usize, mut out: ArrayViewMut1<'_, f32>) {
        out.assign(&self.feats.row(t));
    }
}

/// Streaming feature store: frames are appended as they are produced and
/// the stream is closed with [`FeatureBuffer::input_finished`].
#[derive(Debug, Clone)]
pub struct FeatureBuffer {
    frames: Array2<f32>,
    finished: bool,
}

impl FeatureBuffer {
    pub fn new(dim: usize) -> Self {
        Self {
            frames: Array2::zeros((0, dim)),
            finished: false,
        }
    }

    pub fn accept_frame(&mut self, frame: ArrayView1<'_, f32>) -> Result<(), FeatureError> {
        self.check_open(frame.len())?;
        self.frames.push_row(frame)?;
        Ok(())
    }

    pub fn accept_frames(&mut self, frames: ArrayView2<'_, f32>) -> Result<(), FeatureError> {
        self.check_open(frames.ncols())?;
        for frame in frames.outer_iter() {
            self.frames.push_row(frame)?;
        }
        Ok(())
    }

    pub fn input_finished(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn check_open(&self, dim: usize) -> Result<(), FeatureError> {
        if self.finished {
            return Err(FeatureError::InputFinished);
        }
        if dim != self.frames.ncols() {
            return Err(FeatureError::DimMismatch {
                expected: self.frames.ncols(),
                actual: dim,
            });
        }
        Ok(())
    }
}

impl OnlineFeature for FeatureBuffer {
    fn dim(&self) -> usize {
        self.frames.ncols()
    }

    fn num_frames_ready(&self) -> usize {
        self.frames.nrows()
    }

    fn is_last_frame(&self, frame: usize) -> bool {
        self.finished && frame + 1 == self.frames.nrows()
    }

    fn get_frame(&self, t: usize, mut out: ArrayViewMut1<'_, f32>) {
        out.assign(&self.frames.row(t));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn matrix_feature_reports_last_row() {
        let feats = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let source = MatrixFeature::new(feats.view());
        assert_eq!(source.num_frames_ready(), 3);
        assert_eq!(source.dim(), 2);
        assert!(source.is_last_frame(2));
        assert!(!source.is_last_frame(1));

        let mut out = Array1::zeros(2);
        source.get_frame(1, out.view_mut());
        assert_eq!(out, array![3.0, 4.0]);
    }

    #[test]
    fn buffer_grows_and_finishes() {
        let mut buffer = FeatureBuffer::new(2);
        assert_eq!(buffer.num_frames_ready(), 0);

        buffer.accept_frame(array![1.0, 1.0].view()).unwrap();
        buffer
            .accept_frames(array![[2.0, 2.0], [3.0, 3.0]].view())
            .unwrap();
        assert_eq!(buffer.num_frames_ready(), 3);
        assert!(!buffer.is_last_frame(2));

        buffer.input_finished();
        assert!(buffer.is_last_frame(2));
        assert!(matches!(
            buffer.accept_frame(array![4.0, 4.0].view()),
            Err(FeatureError::InputFinished)
        ));
    }

    #[test]
    fn buffer_rejects_wrong_dim() {
        let mut buffer = FeatureBuffer::new(3);
        let err = buffer.accept_frame(array![1.0, 2.0].view()).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::DimMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(buffer.num_frames_ready(), 0);
    }
}
