pub mod config;
pub mod element;
pub mod error;
pub mod event;
pub mod future;
pub mod harness;
pub mod renderer;
pub mod root;
pub mod scheduler;
pub mod simulator;
#[cfg(test)]
mod tests;
pub mod trace;

pub use config::{HarnessConfig, RootConfig};
pub use element::{Element, ElementChild};
pub use error::{BoxError, ErrorOrigin, HarnessError};
pub use event::{handler, DispatchOptions, EventHandler, NativeEvent, NodeRef, SyntheticEvent};
pub use future::{deferred, yield_now, Deferred, Resolver};
pub use harness::Harness;
pub use renderer::{FlowRenderer, Renderer};
pub use root::Root;
pub use scheduler::{Scheduler, TaskId, TaskOutcome, TaskPhase};
pub use simulator::{EventSimulator, WorkLoopReport};
pub use trace::{TraceComparison, TraceEvent, TraceLog};

pub use fathom_tree::{HostChild, HostNode, Projection, PropValue, RenderedOutput};
