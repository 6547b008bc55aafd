use thiserror::Error;

use crate::node::PaneRole;

/// Recoverable navigation failures, surfaced through [`NavErrorHandler`].
///
/// None of these corrupt the tree; the operation that raised one leaves the
/// current snapshot unchanged unless the variant documents a recovery.
/// Invariant corruption is a programmer error and panics in debug builds
/// instead of flowing through here.
#[derive(Debug, Error)]
pub enum NavError {
    /// The operation's preconditions were not met; the tree is unchanged.
    /// `detail` names the destination involved, if any.
    #[error("{op}: {detail}")]
    InvalidPrecondition { op: &'static str, detail: String },

    /// The tree has no active stack to mutate. Callers recover by creating a
    /// single-screen root stack for the destination.
    #[error("{op}: no active stack ({detail})")]
    NoActiveStack { op: &'static str, detail: String },

    /// A pane operation named a role the pane does not configure.
    #[error("{op}: pane role {role:?} is not configured")]
    UnknownPaneRole { op: &'static str, role: PaneRole },

    /// A back request reached the root with nothing left to pop.
    #[error("navigate_back: nothing left to pop")]
    EmptyPop,

    /// No registered deep-link handler matched the URI.
    #[error("handle_deep_link: no handler matched {uri:?}")]
    DeepLinkUnmatched { uri: String },
}

pub trait NavErrorHandler: Send + Sync {
    fn on_error(&self, error: &NavError);
}

/// Default handler: log and recover.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogErrorHandler;

impl NavErrorHandler for LogErrorHandler {
    fn on_error(&self, error: &NavError) {
        log::warn!("{error}");
    }
}
