use ndarray::{Array2, ArrayView2};

use crate::error::DecodableError;

/// Scaled log-likelihoods for one contiguous run of frames.
///
/// Row `r` holds the scores of frame `begin_frame + r * stride`, and is
/// also the score of every frame up to the next evaluated one. The window
/// answers for frames in `[begin_frame, begin_frame + num_frames)`.
#[derive(Debug, Clone)]
pub struct ScoreWindow {
    begin_frame: usize,
    num_frames: usize,
    stride: usize,
    scores: Array2<f32>,
}

impl ScoreWindow {
    pub fn new(
        begin_frame: usize,
        num_frames: usize,
        stride: usize,
        scores: Array2<f32>,
    ) -> Result<Self, DecodableError> {
        let stride = stride.max(1);
        let expected_rows = num_frames.div_ceil(stride);
        if scores.nrows() != expected_rows {
            return Err(DecodableError::MalformedOutput {
                rows: scores.nrows(),
                cols: scores.ncols(),
                expected_rows,
                expected_cols: scores.ncols(),
            });
        }
        Ok(Self {
            begin_frame,
            num_frames,
            stride,
            scores,
        })
    }

    pub fn begin_frame(&self) -> usize {
        self.begin_frame
    }

    pub fn end_frame(&self) -> usize {
        self.begin_frame + self.num_frames
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_outputs(&self) -> usize {
        self.scores.ncols()
    }

    pub fn scores(&self) -> ArrayView2<'_, f32> {
        self.scores.view()
    }

    pub fn covers(&self, frame: usize) -> bool {
        frame >= self.begin_frame && frame < self.end_frame()
    }

    pub fn get(&self, frame: usize, output_index: usize) -> Result<f32, DecodableError> {
        if !self.covers(frame) {
            return Err(DecodableError::NotCached {
                frame,
                begin: self.begin_frame,
                end: self.end_frame(),
            });
        }
        if output_index >= self.num_outputs() {
            return Err(DecodableError::OutputOutOfRange {
                index: output_index,
                num_outputs: self.num_outputs(),
            });
        }
        let row = (frame - self.begin_frame) / self.stride;
        Ok(self.scores[[row, output_index]])
    }
}

/// Holds at most one [`ScoreWindow`]. Windows are swapped wholesale, never
/// merged.
#[derive(Debug, Default)]
pub struct ScoreCache {
    window: Option<ScoreWindow>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn covers(&self, frame: usize) -> bool {
        self.window.as_ref().is_some_and(|w| w.covers(frame))
    }

    pub fn get(&self, frame: usize, output_index: usize) -> Result<f32, DecodableError> {
        match &self.window {
            Some(window) => window.get(frame, output_index),
            None => Err(DecodableError::NotCached {
                frame,
                begin: 0,
                end: 0,
            }),
        }
    }

    pub fn replace(&mut self, window: ScoreWindow) -> Option<ScoreWindow> {
        self.window.replace(window)
    }

    pub fn clear(&mut self) {
        self.window = None;
    }

    pub fn window(&self) -> Option<&ScoreWindow> {
        self.window.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn window(begin: usize) -> ScoreWindow {
        ScoreWindow::new(begin, 3, 1, array![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]]).unwrap()
    }

    #[test]
    fn empty_cache_covers_nothing() {
        let cache = ScoreCache::new();
        assert!(!cache.covers(0));
        assert!(matches!(
            cache.get(0, 0),
            Err(DecodableError::NotCached { .. })
        ));
    }

    #[test]
    fn window_bounds_are_half_open() {
        let mut cache = ScoreCache::new();
        cache.replace(window(5));
        assert!(!cache.covers(4));
        assert!(cache.covers(5));
        assert!(cache.covers(7));
        assert!(!cache.covers(8));
        assert_eq!(cache.get(6, 1).unwrap(), 3.0);
        assert!(cache.get(8, 0).is_err());
        assert!(cache.get(4, 0).is_err());
    }

    #[test]
    fn output_index_is_checked() {
        let mut cache = ScoreCache::new();
        cache.replace(window(0));
        assert!(matches!(
            cache.get(0, 2),
            Err(DecodableError::OutputOutOfRange {
                index: 2,
                num_outputs: 2
            })
        ));
    }

    #[test]
    fn replace_discards_previous_window() {
        let mut cache = ScoreCache::new();
        cache.replace(window(0));
        let old = cache.replace(window(10));
        assert_eq!(old.map(|w| w.begin_frame()), Some(0));
        assert!(!cache.covers(1));
        assert!(cache.covers(11));

        cache.clear();
        assert!(cache.window().is_none());
        assert!(!cache.covers(11));
    }

    #[test]
    fn strided_rows_cover_their_group() {
        // Frames 4..9 with stride 2: rows for frames 4, 6, 8.
        let window = ScoreWindow::new(4, 5, 2, array![[1.0], [2.0], [3.0]]).unwrap();
        assert_eq!(window.get(4, 0).unwrap(), 1.0);
        assert_eq!(window.get(5, 0).unwrap(), 1.0);
        assert_eq!(window.get(7, 0).unwrap(), 2.0);
        assert_eq!(window.get(8, 0).unwrap(), 3.0);
        assert!(!window.covers(9));
    }

    #[test]
    fn row_count_must_match_span() {
        assert!(ScoreWindow::new(0, 4, 2, array![[1.0]]).is_err());
        assert!(ScoreWindow::new(0, 3, 2, array![[1.0], [2.0]]).is_ok());
    }
}
