use ndarray::ArrayViewMut1;

use super::{Decodable, NnetDecodableBase};
use crate::error::DecodableError;
use crate::feature::OnlineFeature;
use crate::nnet::Network;
use crate::options::NnetDecodableOptions;
use crate::priors::LogPriors;
use crate::transition::TransitionModel;

/// Decodable over a streaming feature source whose frame count grows while
/// decoding runs.
///
/// A cache miss scores whatever frames are ready at that moment and never
/// waits for more.
pub struct NnetDecodableOnline<'a, F, N: ?Sized, T: ?Sized> {
    base: NnetDecodableBase<'a, N, T>,
    features: F,
}

impl<'a, F, N, T> NnetDecodableOnline<'a, F, N, T>
where
    F: OnlineFeature,
    N: Network + ?Sized,
    T: TransitionModel + ?Sized,
{
    pub fn new(
        nnet: &'a mut N,
        log_priors: &'a LogPriors,
        trans_model: &'a T,
        opts: NnetDecodableOptions,
        features: F,
    ) -> Result<Self, DecodableError> {
        Ok(Self {
            base: NnetDecodableBase::new(nnet, log_priors, trans_model, opts)?,
            features,
        })
    }

    pub fn base(&self) -> &NnetDecodableBase<'a, N, T> {
        &self.base
    }

    pub fn features(&self) -> &F {
        &self.features
    }

    /// Access for appending frames. Already produced frames must not change,
    /// cached scores stay valid.
    pub fn features_mut(&mut self) -> &mut F {
        &mut self.features
    }

    /// Switches to a new source, e.g. at an utterance boundary. Frame
    /// indices restart, so all cached scores are dropped.
    pub fn reset_feature(&mut self, features: F) -> F {
        self.base.invalidate();
        log::debug!("Feature source swapped; score cache cleared");
        std::mem::replace(&mut self.features, features)
    }

    pub fn into_features(self) -> F {
        self.features
    }
}

impl<F, N, T> Decodable for NnetDecodableOnline<'_, F, N, T>
where
    F: OnlineFeature,
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
