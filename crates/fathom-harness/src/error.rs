use std::fmt;

use thiserror::Error;

/// Error type accepted from task bodies, microtasks and event handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where a propagated error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    Body,
    Microtask,
    Handler,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorOrigin::Body => write!(f, "task body"),
            ErrorOrigin::Microtask => write!(f, "microtask"),
            ErrorOrigin::Handler => write!(f, "event handler"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot run a task while task #{active} is active")]
    Reentrancy { active: u64 },

    #[error("no active task: {0}")]
    NoActiveTask(&'static str),

    #[error("invalid call context: {0}")]
    InvalidCallContext(&'static str),

    #[error("{origin} failed in task #{task}: {source}")]
    PropagatedBody {
        task: u64,
        origin: ErrorOrigin,
        #[source]
        source: BoxError,
    },

    #[error("task #{0} stalled: async body is pending with no queued work")]
    Stalled(u64),

    #[error("task #{task} exceeded the microtask limit ({limit})")]
    MicrotaskLimitExceeded { task: u64, limit: usize },

    #[error("root #{0} has been destroyed")]
    RootDestroyed(u64),

    #[error("render error: {0}")]
    Render(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("projection error: {0}")]
    Projection(#[from] fathom_tree::ProjectionError),
}

impl HarnessError {
    /// The wrapped body error, if this is a propagated failure.
    pub fn body_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            HarnessError::PropagatedBody { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
