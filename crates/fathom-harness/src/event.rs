use std::fmt;
use std::rc::Rc;

use fathom_tree::PropValue;
use serde::{Deserialize, Serialize};

use crate::error::BoxError;
use crate::scheduler::TaskOutcome;

/// Opaque reference to an event target, bound to an element at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef(pub u64);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Replace an undelivered event with the same target and type.
    pub is_unique: bool,
}

impl DispatchOptions {
    pub fn unique() -> Self {
        DispatchOptions { is_unique: true }
    }
}

/// An event produced on the UI side, waiting for the work loop.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent {
    pub sequence: u64,
    pub target: NodeRef,
    pub event_type: String,
    pub payload: Option<PropValue>,
    pub is_unique: bool,
}

impl NativeEvent {
    /// Coalescing key is the `(target, event_type)` pair.
    pub(crate) fn coalesces_with(&self, other: &NativeEvent) -> bool {
        self.target == other.target && self.event_type == other.event_type
    }
}

/// The event object handed to logic-side handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticEvent {
    pub target: NodeRef,
    pub event_type: String,
    /// `Null` when the native event carried no payload.
    pub payload: PropValue,
    pub sequence: u64,
}

impl From<NativeEvent> for SyntheticEvent {
    fn from(event: NativeEvent) -> Self {
        SyntheticEvent {
            target: event.target,
            event_type: event.event_type,
            payload: event.payload.unwrap_or(PropValue::Null),
            sequence: event.sequence,
        }
    }
}

pub type EventHandler = Rc<dyn Fn(&SyntheticEvent) -> Result<(), BoxError>>;

/// Wrap a closure as an [`EventHandler`].
pub fn handler<F, R>(f: F) -> EventHandler
where
    F: Fn(&SyntheticEvent) -> R + 'static,
    R: TaskOutcome,
{
    Rc::new(move |event: &SyntheticEvent| f(event).into_result())
}
