use ndarray::{ArrayView2, ArrayViewMut1};

use super::{Decodable, NnetDecodableBase};
use crate::error::DecodableError;
use crate::feature::{MatrixFeature, OnlineFeature};
use crate::nnet::Network;
use crate::options::NnetDecodableOptions;
use crate::priors::LogPriors;
use crate::transition::TransitionModel;

/// Decodable over a complete feature matrix, one row per frame.
pub struct NnetDecodable<'a, N: ?Sized, T: ?Sized> {
    base: NnetDecodableBase<'a, N, T>,
    features: MatrixFeature<'a>,
}

impl<'a, N, T> NnetDecodable<'a, N, T>
where
    N: Network + ?Sized,
    T: TransitionModel + ?Sized,
{
    pub fn new(
        nnet: &'a mut N,
        log_priors: &'a LogPriors,
        trans_model: &'a T,
        opts: NnetDecodableOptions,
        feats: ArrayView2<'a, f32>,
    ) -> Result<Self, DecodableError> {
        Ok(Self {
            base: NnetDecodableBase::new(nnet, log_priors, trans_model, opts)?,
            features: MatrixFeature::new(feats),
        })
    }

    pub fn base(&self) -> &NnetDecodableBase<'a, N, T> {
        &self.base
    }

    pub fn features(&self) -> ArrayView2<'a, f32> {
        self.features.view()
    }
}

impl<N, T> Decodable for NnetDecodable<'_, N, T>
where
    N: Network + ?Sized,
    T: TransitionModel + ?Sized,
{
    fn log_likelihood(&mut self, frame: usize, index: usize) -> Result<f32, DecodableError> {
        self.base.log_likelihood(&self.features, frame, index)
    }

    fn num_frames_ready(&self) -> usize {
        self.features.num_frames_ready()
    }

    fn is_last_frame(&self, frame: usize) -> bool {
        self.features.is_last_frame(frame)
    }

    fn feat_dim(&self) -> usize {
        self.features.dim()
    }

    fn get_frame(&self, t: usize, out: ArrayViewMut1<'_, f32>) -> Result<(), DecodableError> {
        self.base.get_frame(&self.features, t, out)
    }

    fn num_indices(&self) -> usize {
        self.base.num_indices()
    }
}
