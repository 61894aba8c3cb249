//! Independent reasons for holding the source paused.

/// Why the bridge wants the source paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauseReason {
    /// The sink refused more data until it drains.
    Backpressure,
    /// The transform asked to hold the current chunk.
    Transform,
}

/// The set of active pause reasons: none, backpressure, transform, or both.
///
/// The source is paused when the set goes from empty to non-empty and
/// resumed only when it becomes empty again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PauseReasons {
    backpressure: bool,
    transform: bool,
}

/// What the caller must do to the source after a change to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Pause,
    Resume,
    Unchanged,
}

impl PauseReasons {
    /// Returns true if any reason is active.
    pub fn is_paused(&self) -> bool {
        self.backpressure || self.transform
    }

    /// Returns true if `reason` is active.
    pub fn contains(&self, reason: PauseReason) -> bool {
        match reason {
            PauseReason::Backpressure => self.backpressure,
            PauseReason::Transform => self.transform,
        }
    }

    pub(crate) fn raise(&mut self, reason: PauseReason) -> Transition {
        let was_paused = self.is_paused();
        self.set(reason, true);
        if was_paused {
            Transition::Unchanged
        } else {
            Transition::Pause
        }
    }

    pub(crate) fn clear(&mut self, reason: PauseReason) -> Transition {
        let was_paused = self.is_paused();
        self.set(reason, false);
        if was_paused && !self.is_paused() {
            Transition::Resume
        } else {
            Transition::Unchanged
        }
    }

    fn set(&mut self, reason: PauseReason, on: bool) {
        match reason {
            PauseReason::Backpressure => self.backpressure = on,
            PauseReason::Transform => self.transform = on,
        }
    }
}
