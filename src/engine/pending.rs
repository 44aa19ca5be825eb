use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tokio_util::sync::CancellationToken;

/// Completion state of an in-flight asynchronous engine creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationState {
    Pending,
    /// The engine arrived and was handed to its owner.
    Resolved,
    /// The owner went away before the engine arrived.
    Abandoned,
}

impl fmt::Display for CreationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreationState::Pending => write!(f, "pending"),
            CreationState::Resolved => write!(f, "resolved"),
            CreationState::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Token shared between the owner of an asynchronous creation and the task
/// awaiting it.
///
/// The engine module offers no way to cancel a handshake, so abandonment is
/// only recorded here. Whoever receives the engine checks the token first and
/// disposes the engine instead of exposing it when the token was abandoned.
/// `Resolved` and `Abandoned` are mutually exclusive and final.
#[derive(Debug, Clone, Default)]
pub struct PendingCreation {
    abandoned: CancellationToken,
    resolved: Rc<Cell<bool>>,
}

impl PendingCreation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CreationState {
        if self.resolved.get() {
            CreationState::Resolved
        } else if self.abandoned.is_cancelled() {
            CreationState::Abandoned
        } else {
            CreationState::Pending
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.state() == CreationState::Abandoned
    }

    /// Mark the creation abandoned. Returns `false` if it had already been
    /// resolved or abandoned.
    pub fn abandon(&self) -> bool {
        if self.state() != CreationState::Pending {
            return false;
        }
        self.abandoned.cancel();
        true
    }

    /// Mark the creation resolved. Returns `false` if it was abandoned (or
    /// already resolved), in which case the caller owns the deferred dispose.
    pub(crate) fn resolve(&self) -> bool {
        if self.state() != CreationState::Pending {
            return false;
        }
        self.resolved.set(true);
        true
    }
}
