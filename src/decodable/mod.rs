//! Acoustic scoring for graph-search decoders: the [`Decodable`] facade and
//! the shared batched, cached scoring core behind both decodables.

use std::time::Instant;

use ndarray::{Array2, ArrayViewMut1};

use crate::error::DecodableError;
use crate::feature::OnlineFeature;
use crate::nnet::Network;
use crate::options::NnetDecodableOptions;
use crate::priors::LogPriors;
use crate::transition::TransitionModel;

pub mod cache;
mod matrix;
mod online;
pub mod planner;
pub mod skip;

pub use cache::{ScoreCache, ScoreWindow};
pub use matrix::NnetDecodable;
pub use online::NnetDecodableOnline;
pub use planner::{plan_batch, BatchPlan};
pub use skip::{ResolvedFrame, SkipResolver};

/// Network outputs are floored here before taking the log.
pub const PROB_FLOOR: f32 = 1e-20;

/// What a graph-search decoder queries for acoustic scores.
///
/// Indices are one-based transition ids.
pub trait Decodable {
    /// Scaled log-likelihood of transition id `index` at `frame`.
    fn log_likelihood(&mut self, frame: usize, index: usize) -> Result<f32, DecodableError>;

    fn num_frames_ready(&self) -> usize;

    fn is_last_frame(&self, frame: usize) -> bool;

    fn feat_dim(&self) -> usize;

    fn get_frame(&self, t: usize, out: ArrayViewMut1<'_, f32>) -> Result<(), DecodableError>;

    fn num_indices(&self) -> usize;
}

/// Scoring state shared by the matrix and streaming decodables: the
/// borrowed network, priors and transition model, plus the score cache.
///
/// The feature source is passed into each call so the variants can own or
/// swap it as they need.
pub struct NnetDecodableBase<'a, N: ?Sized, T: ?Sized> {
    nnet: &'a mut N,
    log_priors: &'a LogPriors,
    trans_model: &'a T,
    opts: NnetDecodableOptions,
    resolver: SkipResolver,
    num_pdfs: usize,
    cache: ScoreCache,
}

impl<'a, N, T> NnetDecodableBase<'a, N, T>
where
    N: Network + ?Sized,
    T: TransitionModel + ?Sized,
{
    pub fn new(
        nnet: &'a mut N,
        log_priors: &'a LogPriors,
        trans_model: &'a T,
        opts: NnetDecodableOptions,
    ) -> Result<Self, DecodableError> {
        opts.validate()?;
        let num_pdfs = nnet.output_dim();
        if log_priors.len() != num_pdfs {
            return Err(DecodableError::PriorDimMismatch {
                priors: log_priors.len(),
                outputs: num_pdfs,
            });
        }
        Ok(Self {
            nnet,
            log_priors,
            trans_model,
            resolver: SkipResolver::from_options(&opts),
            opts,
            num_pdfs,
            cache: ScoreCache::new(),
        })
    }

    pub fn options(&self) -> &NnetDecodableOptions {
        &self.opts
    }

    pub fn num_pdfs(&self) -> usize {
        self.num_pdfs
    }

    pub fn num_indices(&self) -> usize {
        self.trans_model.num_transition_ids()
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    /// Drops all cached scores.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn log_likelihood<F: OnlineFeature + ?Sized>(
        &mut self,
        feats: &F,
        frame: usize,
        index: usize,
    ) -> Result<f32, DecodableError> {
        let num_indices = self.num_indices();
        if index == 0 || index > num_indices {
            return Err(DecodableError::IndexOutOfRange { index, num_indices });
        }
        let pdf = self.trans_model.transition_id_to_pdf(index);
        if pdf >= self.num_pdfs {
            return Err(DecodableError::PdfOutOfRange {
                transition_id: index,
                pdf,
                num_pdfs: self.num_pdfs,
            });
        }
        self.compute_for_frame(feats, frame)?;
        self.cache.get(frame, pdf)
    }

    pub fn get_frame<F: OnlineFeature + ?Sized>(
        &self,
        feats: &F,
        t: usize,
        out: ArrayViewMut1<'_, f32>,
    ) -> Result<(), DecodableError> {
        let ready = feats.num_frames_ready();
        if t >= ready {
            return Err(DecodableError::FrameOutOfRange { frame: t, ready });
        }
        if out.len() != feats.dim() {
            return Err(DecodableError::BufferDimMismatch {
                expected: feats.dim(),
                actual: out.len(),
            });
        }
        feats.get_frame(t, out);
        Ok(())
    }

    /// Makes sure the cache holds `frame`, evaluating a new window from the
    /// frame's evaluated position onward if it does not.
    fn compute_for_frame<F: OnlineFeature + ?Sized>(
        &mut self,
        feats: &F,
        frame: usize,
    ) -> Result<(), DecodableError> {
        let ready = feats.num_frames_ready();
        if frame >= ready {
            return Err(DecodableError::FrameOutOfRange { frame, ready });
        }
        if self.cache.covers(frame) {
            return Ok(());
        }

        let start = Instant::now();
        let plan = plan_batch(
            self.resolver.position(frame),
            self.resolver.num_positions(ready),
            self.opts.max_nnet_batch_size,
        );
        let probs = if self.resolver.is_split() {
            self.forward_split(feats, plan)?
        } else {
            self.forward_positions(feats, plan)?
        };
        let scores = self.scale_loglikes(probs, plan.len)?;

        let begin_frame = self.resolver.position_frame(plan.begin);
        let end_frame = self.resolver.position_frame(plan.end()).min(ready);
        self.cache.replace(ScoreWindow::new(
            begin_frame,
            end_frame - begin_frame,
            self.resolver.stride(),
            scores,
        )?);

        log::debug!(
            "Scored frames [{}, {}) with {} network rows in {:?}",
            begin_frame,
            end_frame,
            plan.len,
            start.elapsed()
        );
        Ok(())
    }

    /// One input row per evaluated position.
    fn forward_positions<F: OnlineFeature + ?Sized>(
        &mut self,
        feats: &F,
        plan: BatchPlan,
    ) -> Result<Array2<f32>, DecodableError> {
        let mut input = Array2::zeros((plan.len, feats.dim()));
        for (row, position) in input.outer_iter_mut().zip(plan.range()) {
            feats.get_frame(self.resolver.position_frame(position), row);
        }
        Ok(self.nnet.forward(input.view())?)
    }

    /// Fetches the contiguous run covering every position's input frames
    /// and lets the network pool each group.
    fn forward_split<F: OnlineFeature + ?Sized>(
        &mut self,
        feats: &F,
        plan: BatchPlan,
    ) -> Result<Array2<f32>, DecodableError> {
        let first = self.resolver.frames_for_position(plan.begin).start;
        let last = self.resolver.frames_for_position(plan.end() - 1).end;

        let mut input = Array2::zeros((last - first, feats.dim()));
        for (row, t) in input.outer_iter_mut().zip(first..last) {
            feats.get_frame(t, row);
        }
        let groups: Vec<_> = plan
            .range()
            .map(|position| {
                let frames = self.resolver.frames_for_position(position);
                frames.start - first..frames.end - first
            })
            .collect();
        Ok(self.nnet.forward_grouped(input.view(), &groups)?)
    }

    /// Turns posteriors into `acoustic_scale * (ln p - ln prior)`.
    fn scale_loglikes(
        &self,
        mut probs: Array2<f32>,
        expected_rows: usize,
    ) -> Result<Array2<f32>, DecodableError> {
        if probs.dim() != (expected_rows, self.num_pdfs) {
            return Err(DecodableError::MalformedOutput {
                rows: probs.nrows(),
                cols: probs.ncols(),
                expected_rows,
                expected_cols: self.num_pdfs,
            });
        }
        if let Some(((row, col), &value)) = probs.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(DecodableError::NonFiniteOutput { row, col, value });
        }
        let log_priors = self.log_priors.view();
        let scale = self.opts.acoustic_scale;
        for mut row in probs.outer_iter_mut() {
            row.zip_mut_with(&log_priors, |v, &prior| {
                *v = ((*v).max(PROB_FLOOR).ln() - prior) * scale;
            });
        }
        Ok(probs)
    }
}
