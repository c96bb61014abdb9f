use std::ops::Range;

/// The extent of one network evaluation, in the units it was planned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub begin: usize,
    pub len: usize,
}

impl BatchPlan {
    pub fn end(&self) -> usize {
        self.begin + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.begin..self.end()
    }
}

/// Plans the next evaluation window starting exactly at `requested`.
///
/// The window never reaches past `num_ready`, so a slow stream may yield a
/// single-frame window. Requires `requested < num_ready` and `max_batch >= 1`.
pub fn plan_batch(requested: usize, num_ready: usize, max_batch: usize) -> BatchPlan {
    debug_assert!(requested < num_ready, "frame {requested} not ready ({num_ready})");
    debug_assert!(max_batch >= 1);
    BatchPlan {
        begin: requested,
        len: max_batch.min(num_ready.saturating_sub(requested)).max(1),
    }
}
