//! # Switchback runtime
//!
//! The reactive layer over the navigation tree: observable signals, the
//! transition/predictive-back state machine, parent-child result passing,
//! back interception, deep-link dispatch, and the [`Navigator`] facade that
//! sequences a mutation, the lifecycle diff, and the transition into one
//! atomic step.
//!
//! ```rust
//! use switchback_core::RouteDestination;
//! use switchback_runtime::{Navigator, NavigatorConfig};
//!
//! let nav = Navigator::with_start(
//!     RouteDestination::shared("home"),
//!     NavigatorConfig::default(),
//! );
//! nav.navigate(RouteDestination::shared("home/detail"), None);
//! assert!(nav.can_navigate_back().get());
//! assert!(nav.navigate_back());
//! assert!(!nav.navigate_back()); // nothing left; host closes the window
//! ```
//!
//! All mutating calls belong on one host-chosen write thread. Emitted
//! values are immutable snapshots and safe to hand to any thread.

pub mod back;
pub mod deeplink;
pub mod lifecycle;
pub mod navigator;
pub mod result;
pub mod signal;
pub mod transition;

pub use back::{BackHandlerRegistry, Dispose};
pub use deeplink::{DeepLinkHandler, DeepLinkRegistry};
pub use lifecycle::{LifecycleNotifier, LifecycleObserver};
pub use navigator::{Navigator, NavigatorConfig};
pub use result::{Cancelled, ResultChannel, ResultHandle};
pub use signal::{Signal, SubId, signal};
pub use transition::{
    NavTransition, TransitionDir, TransitionFrame, TransitionManager, TransitionState,
};
