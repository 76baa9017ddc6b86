/// Counters for render requests versus composites actually run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Every call to [`FrameScheduler::request`].
    pub requested: u64,
    /// Requests absorbed by an already pending frame.
    pub coalesced: u64,
    /// Frames that ran a composite.
    pub rendered: u64,
}

/// One-shot-per-frame render coalescing.
///
/// Mutations call [`FrameScheduler::request`]; the host's display-refresh callback calls
/// [`FrameScheduler::take_pending`] and composites when it returns `true`. Any number of requests
/// between two refreshes collapse into a single composite.
#[derive(Clone, Debug, Default)]
pub struct FrameScheduler {
    pending: bool,
    stats: FrameStats,
}

impl FrameScheduler {
    /// Idle scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a composite on the next refresh. Returns `false` if one was already pending.
    pub fn request(&mut self) -> bool {
        self.stats.requested += 1;
        if self.pending {
            self.stats.coalesced += 1;
            return false;
        }
        self.pending = true;
        true
    }

    /// Consume the pending request, if any.
    pub fn take_pending(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.stats.rendered += 1;
        true
    }

    /// Whether a composite is queued.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Counters since construction.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}
