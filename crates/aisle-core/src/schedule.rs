//! Update pacing primitives.
//!
//! The virtualizer decouples the *target* state written by high-frequency
//! input events from the *committed* state applied to rendering: scroll
//! handlers write a target, and a per-frame commit applies it at most once
//! per display refresh. [`Debouncer`] covers the slower cases (container
//! resize, zoom re-checks) where work should run only after input goes
//! quiet. Both are independent of any UI framework's reactivity model.

/// Latest-wins staging area committed at most once per frame.
///
/// Any number of targets may be set between frames; only the newest survives
/// to the next [`commit_frame`](Self::commit_frame) call.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler<T> {
    target: Option<T>,
    committed: Option<T>,
}

impl<T: PartialEq> FrameScheduler<T> {
    /// Empty scheduler with nothing staged or committed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: None,
            committed: None,
        }
    }

    /// Stage a new target, replacing any previous uncommitted one.
    pub fn set_target(&mut self, target: T) {
        self.target = Some(target);
    }

    /// Whether a target is staged that differs from the committed state.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        match (&self.target, &self.committed) {
            (Some(t), Some(c)) => t != c,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Apply the staged target, if it changes anything.
    ///
    /// Returns the newly committed value once per change; repeated calls
    /// without a new target are no-ops.
    pub fn commit_frame(&mut self) -> Option<&T> {
        let target = self.target.take()?;
        if self.committed.as_ref() == Some(&target) {
            return None;
        }
        self.committed = Some(target);
        self.committed.as_ref()
    }

    /// The last committed value.
    #[must_use]
    pub fn committed(&self) -> Option<&T> {
        self.committed.as_ref()
    }
}

/// Quiet-period trigger.
///
/// Each [`note`](Self::note) pushes the deadline out; [`fire`](Self::fire)
/// reports `true` exactly once after the configured quiet window elapses
/// with no further notes.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet_ms: u64,
    deadline: Option<u64>,
}

impl Debouncer {
    /// Debouncer with the given quiet window.
    #[must_use]
    pub fn new(quiet_ms: u64) -> Self {
        Self {
            quiet_ms,
            deadline: None,
        }
    }

    /// Record an event at `now_ms`, pushing the deadline out.
    pub fn note(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms + self.quiet_ms);
    }

    /// Whether a trigger is armed.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Fire once the quiet window has elapsed.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
