use std::ops::Range;

use crate::options::{NnetDecodableOptions, SkipType};

/// The evaluated frame that answers for a requested frame, and the input
/// frames the network needs to score it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFrame {
    pub evaluated_frame: usize,
    pub frames_to_fetch: Range<usize>,
}

/// Maps frames onto the temporal subsample the network is evaluated on.
///
/// With skip width `w` only frames at multiples of `w + 1` are evaluated.
/// Positions index those evaluated frames: position `k` is frame
/// `k * (w + 1)`. With `w == 0` every frame is its own position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipResolver {
    skip_width: usize,
    skip_type: SkipType,
}

impl SkipResolver {
    pub fn new(skip_width: usize, skip_type: SkipType) -> Self {
        Self {
            skip_width,
            skip_type,
        }
    }

    pub fn from_options(opts: &NnetDecodableOptions) -> Self {
        Self::new(opts.skip_width, opts.skip_type)
    }

    pub fn is_active(&self) -> bool {
        self.skip_width > 0
    }

    /// True when evaluated scores are computed from a run of frames rather
    /// than the evaluated frame alone.
    pub fn is_split(&self) -> bool {
        self.is_active() && self.skip_type == SkipType::Split
    }

    pub fn stride(&self) -> usize {
        self.skip_width + 1
    }

    pub fn resolve(&self, frame: usize) -> ResolvedFrame {
        let position = self.position(frame);
        ResolvedFrame {
            evaluated_frame: self.position_frame(position),
            frames_to_fetch: self.frames_for_position(position),
        }
    }

    pub fn position(&self, frame: usize) -> usize {
        frame / self.stride()
    }

    pub fn position_frame(&self, position: usize) -> usize {
        position * self.stride()
    }

    /// Number of positions whose evaluated frame is below `num_frames`.
    pub fn num_positions(&self, num_frames: usize) -> usize {
        num_frames.div_ceil(self.stride())
    }

    /// Input frames for one position. Split uses the evaluated frame and up
    /// to `w` frames before it, so the set never depends on frames that
    /// arrive later.
    pub fn frames_for_position(&self, position: usize) -> Range<usize> {
        let frame = self.position_frame(position);
        if self.is_split() {
            frame.saturating_sub(self.skip_width)..frame + 1
        } else {
            frame..frame + 1
        }
    }
}
