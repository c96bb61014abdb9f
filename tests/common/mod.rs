#![allow(dead_code)]

use std::cell::RefCell;

use ndarray::{Array1, Array2, ArrayView2, ArrayViewMut1};
use nnet_decodable::{Network, NetworkError, OnlineFeature, TransitionTable};

/// Row-wise deterministic network: softmax over `(j + 1) * 0.1 * sum(row)`.
/// Records every batch it is given.
pub struct MockNet {
    pub num_pdfs: usize,
    pub inputs: Vec<Array2<f32>>,
    pub fail: bool,
    pub drop_last_row: bool,
}

impl MockNet {
    pub fn new(num_pdfs: usize) -> Self {
        Self {
            num_pdfs,
            inputs: Vec::new(),
            fail: false,
            drop_last_row: false,
        }
    }

    pub fn num_calls(&self) -> usize {
        self.inputs.len()
    }

    pub fn rows_per_call(&self) -> Vec<usize> {
        self.inputs.iter().map(|i| i.nrows()).collect()
    }

    /// The distribution this network emits for a single input row.
    pub fn posterior(&self, row: &[f32]) -> Array1<f32> {
        let total: f32 = row.iter().sum();
        let logits: Vec<f32> = (0..self.num_pdfs)
            .map(|j| (j as f32 + 1.0) * 0.1 * total)
            .collect();
        let max = logits.iter().fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
        let sum: f32 = exps.iter().sum();
        Array1::from_iter(exps.into_iter().map(|e| e / sum))
    }
}

impl Network for MockNet {
    fn output_dim(&self) -> usize {
        self.num_pdfs
    }

    fn forward(&mut self, frames: ArrayView2<'_, f32>) -> Result<Array2<f32>, NetworkError> {
        self.inputs.push(frames.to_owned());
        if self.fail {
            return Err(NetworkError::Backend("device lost".into()));
        }
        let rows = if self.drop_last_row {
            frames.nrows().saturating_sub(1)
        } else {
            frames.nrows()
        };
        let mut out = Array2::zeros((rows, self.num_pdfs));
        for (mut o, f) in out.outer_iter_mut().zip(frames.outer_iter()) {
            let row: Vec<f32> = f.iter().copied().collect();
            o.assign(&self.posterior(&row));
        }
        Ok(out)
    }
}

/// Emits the same distribution for every row.
pub struct ConstNet {
    pub probs: Array1<f32>,
}

impl Network for ConstNet {
    fn output_dim(&self) -> usize {
        self.probs.len()
    }

    fn forward(&mut self, frames: ArrayView2<'_, f32>) -> Result<Array2<f32>, NetworkError> {
        let mut out = Array2::zeros((frames.nrows(), self.probs.len()));
        for mut row in out.outer_iter_mut() {
            row.assign(&self.probs);
        }
        Ok(out)
    }
}

/// Feature `t` is `[0.5 * t, 1 - 0.25 * t]`, so every frame scores differently.
pub fn ramp_features(num_frames: usize) -> Array2<f32> {
    Array2::from_shape_fn((num_frames, 2), |(t, d)| {
        if d == 0 {
            0.5 * t as f32
        } else {
            1.0 - 0.25 * t as f32
        }
    })
}

/// Two transition ids per pdf: ids `2p + 1` and `2p + 2` map to pdf `p`.
pub fn two_ids_per_pdf(num_pdfs: usize) -> TransitionTable {
    TransitionTable::new((0..num_pdfs * 2).map(|i| i / 2).collect())
}

/// Streaming source with a manually advanced ready count. Panics if a frame
/// is read before it is ready.
pub struct ScriptedFeature {
    pub frames: Array2<f32>,
    pub ready: usize,
    pub finished: bool,
    pub reads: RefCell<Vec<usize>>,
}

impl ScriptedFeature {
    pub fn new(frames: Array2<f32>, ready: usize) -> Self {
        Self {
            frames,
            ready,
            finished: false,
            reads: RefCell::new(Vec::new()),
        }
    }
}

impl OnlineFeature for ScriptedFeature {
    fn dim(&self) -> usize {
        self.frames.ncols()
    }

    fn num_frames_ready(&self) -> usize {
        self.ready
    }

    fn is_last_frame(&self, frame: usize) -> bool {
        self.finished && frame + 1 == self.ready
    }

    fn get_frame(&self, t: usize, mut out: ArrayViewMut1<'_, f32>) {
        assert!(t < self.ready, "frame {t} read while only {} ready", self.ready);
        self.reads.borrow_mut().push(t);
        out.assign(&self.frames.row(t));
    }
}
