//! # Transition state machine
//!
//! Animation progress is driven entirely from outside: the renderer (or a
//! test harness) feeds progress updates, the gesture layer feeds predictive
//! back. The machine only polices which moves are legal and keeps the
//! published state consistent with the tree — a navigation's new snapshot is
//! always observable before its transition flips to in-progress.

use std::time::Duration;

use switchback_core::NodeKey;

use crate::signal::{Signal, signal};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransitionDir {
    None,
    Push,
    Pop,
}

/// Opaque animation descriptor attached to a navigation event. The renderer
/// interprets it; the core only carries it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavTransition {
    pub slide_px: f32,
    pub fade: bool,
    pub duration: Duration,
}

impl Default for NavTransition {
    fn default() -> Self {
        Self {
            slide_px: 60.0,
            fade: true,
            duration: Duration::from_millis(300),
        }
    }
}

impl NavTransition {
    pub fn fast() -> Self {
        Self {
            duration: Duration::from_millis(150),
            ..Self::default()
        }
    }

    /// No visual movement; the snapshot just swaps.
    pub fn cut() -> Self {
        Self {
            slide_px: 0.0,
            fade: false,
            duration: Duration::ZERO,
        }
    }

    /// Resolves what the renderer draws at `progress` of a push or pop: the
    /// incoming surface slides in from the trailing edge on a push and back
    /// out on a pop, staying mostly opaque while fading.
    pub fn frame(&self, progress: f32, dir: TransitionDir) -> TransitionFrame {
        let t = progress.clamp(0.0, 1.0);
        let (slide, sign) = match dir {
            TransitionDir::Push => (1.0 - t, 1.0),
            TransitionDir::Pop => (t, -1.0),
            TransitionDir::None => (0.0, 0.0),
        };
        let alpha = if self.fade {
            0.75 + 0.25 * (1.0 - slide)
        } else {
            1.0
        };
        TransitionFrame {
            dx: slide * self.slide_px * sign,
            alpha,
        }
    }
}

/// One resolved visual frame of a transition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionFrame {
    /// Horizontal offset in pixels for the incoming surface.
    pub dx: f32,
    /// Opacity of the incoming surface.
    pub alpha: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransitionState {
    Idle,
    /// A navigation-driven animation between two snapshots.
    InProgress {
        transition: NavTransition,
        dir: TransitionDir,
        progress: f32,
        from_key: Option<NodeKey>,
        to_key: Option<NodeKey>,
    },
    /// A user gesture tentatively revealing the previous screen.
    PredictiveBack {
        progress: f32,
        touch_x: f32,
        touch_y: f32,
        current_key: Option<NodeKey>,
        previous_key: Option<NodeKey>,
        is_committed: bool,
    },
    /// Scrubbing a transition by hand; test harnesses and replay only.
    Seeking {
        transition: NavTransition,
        progress: f32,
    },
}

impl TransitionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, TransitionState::Idle)
    }
}

pub struct TransitionManager {
    state: Signal<TransitionState>,
}

impl TransitionManager {
    pub fn new() -> Self {
        Self {
            state: signal(TransitionState::Idle),
        }
    }

    pub fn state(&self) -> Signal<TransitionState> {
        self.state.clone()
    }

    pub fn current(&self) -> TransitionState {
        self.state.get()
    }

    /// Starts a navigation animation. A still-running animation is simply
    /// restarted; an active back gesture is surrendered to the navigation.
    pub(crate) fn begin(
        &self,
        transition: NavTransition,
        dir: TransitionDir,
        from_key: Option<NodeKey>,
        to_key: Option<NodeKey>,
    ) {
        if let TransitionState::PredictiveBack { .. } = self.state.get() {
            log::warn!("transition: navigation interrupted an active back gesture");
        }
        self.state.set(TransitionState::InProgress {
            transition,
            dir,
            progress: 0.0,
            from_key,
            to_key,
        });
    }

    pub fn update_progress(&self, p: f32) {
        match self.state.get() {
            TransitionState::InProgress {
                transition,
                dir,
                from_key,
                to_key,
                ..
            } => self.state.set(TransitionState::InProgress {
                transition,
                dir,
                progress: p.clamp(0.0, 1.0),
                from_key,
                to_key,
            }),
            TransitionState::Seeking { transition, .. } => {
                self.state.set(TransitionState::Seeking {
                    transition,
                    progress: p.clamp(0.0, 1.0),
                });
            }
            _ => log::warn!("transition: progress update with no transition running"),
        }
    }

    pub fn complete(&self) {
        match self.state.get() {
            TransitionState::InProgress { .. } | TransitionState::Seeking { .. } => {
                self.state.set(TransitionState::Idle);
            }
            TransitionState::Idle => {}
            TransitionState::PredictiveBack { .. } => {
                log::warn!("transition: complete() during a back gesture; ignored");
            }
        }
    }

    pub(crate) fn start_predictive_back(
        &self,
        current_key: Option<NodeKey>,
        previous_key: Option<NodeKey>,
    ) {
        if !self.state.get().is_idle() {
            log::warn!("transition: back gesture ignored while another transition runs");
            return;
        }
        self.state.set(TransitionState::PredictiveBack {
            progress: 0.0,
            touch_x: 0.0,
            touch_y: 0.0,
            current_key,
            previous_key,
            is_committed: false,
        });
    }

    pub fn update_predictive_back(&self, p: f32, x: f32, y: f32) {
        let TransitionState::PredictiveBack {
            current_key,
            previous_key,
            is_committed,
            ..
        } = self.state.get()
        else {
            log::warn!("transition: back gesture update with no gesture active");
            return;
        };
        self.state.set(TransitionState::PredictiveBack {
            progress: p.clamp(0.0, 1.0),
            touch_x: x.clamp(0.0, 1.0),
            touch_y: y.clamp(0.0, 1.0),
            current_key,
            previous_key,
            is_committed,
        });
    }

    /// Abandons the gesture. The tree was never touched, so there is
    /// nothing to roll back.
    pub fn cancel_predictive_back(&self) {
        if let TransitionState::PredictiveBack { .. } = self.state.get() {
            self.state.set(TransitionState::Idle);
        } else {
            log::warn!("transition: back gesture cancel with no gesture active");
        }
    }

    pub(crate) fn mark_back_committed(&self) -> bool {
        let TransitionState::PredictiveBack {
            progress,
            touch_x,
            touch_y,
            current_key,
            previous_key,
            ..
        } = self.state.get()
        else {
            return false;
        };
        self.state.set(TransitionState::PredictiveBack {
            progress,
            touch_x,
            touch_y,
            current_key,
            previous_key,
            is_committed: true,
        });
        true
    }

    pub(crate) fn settle(&self) {
        self.state.set(TransitionState::Idle);
    }

    /// Test-harness entry: scrub a transition without a navigation.
    pub fn seek(&self, transition: NavTransition, progress: f32) {
        if !self.state.get().is_idle() {
            log::warn!("transition: seek is only legal from idle");
            return;
        }
        self.state.set(TransitionState::Seeking {
            transition,
            progress: progress.clamp(0.0, 1.0),
        });
    }

    pub fn end_seek(&self) {
        if let TransitionState::Seeking { .. } = self.state.get() {
            self.state.set(TransitionState::Idle);
        }
    }
}

impl Default for TransitionManager {
    fn default() -> Self {
        Self::new()
    }
}
