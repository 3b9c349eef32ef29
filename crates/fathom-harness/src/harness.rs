use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

use fathom_tree::PropValue;

use crate::config::{HarnessConfig, RootConfig};
use crate::error::HarnessError;
use crate::event::{DispatchOptions, NodeRef};
use crate::renderer::{FlowRenderer, Renderer};
use crate::root::Root;
use crate::scheduler::{Scheduler, TaskId, TaskOutcome};
use crate::simulator::{EventSimulator, WorkLoopReport};
use crate::trace::TraceLog;

/// Entry point for tests: owns one scheduler, one event simulator and
/// allocates roots and node refs.
///
/// Independent harnesses share nothing.
#[derive(Clone)]
pub struct Harness {
    scheduler: Scheduler,
    simulator: EventSimulator,
    next_ref: Rc<Cell<u64>>,
    next_root: Rc<Cell<u64>>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(HarnessConfig::default())
    }
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        let scheduler = Scheduler::new(config);
        let simulator = EventSimulator::new(scheduler.clone());
        Harness {
            scheduler,
            simulator,
            next_ref: Rc::new(Cell::new(1)),
            next_root: Rc::new(Cell::new(1)),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn simulator(&self) -> &EventSimulator {
        &self.simulator
    }

    /// Create a root laid out by [`FlowRenderer`].
    pub fn create_root(&self, config: RootConfig) -> Root {
        self.create_root_with_renderer(config, Box::new(FlowRenderer::default()))
    }

    pub fn create_root_with_renderer(&self, config: RootConfig, renderer: Box<dyn Renderer>) -> Root {
        let id = self.next_root.get();
        self.next_root.set(id + 1);
        log::debug!(
            "root #{id} created ({}x{} @{}x)",
            config.viewport_width,
            config.viewport_height,
            config.point_scale_factor
        );
        Root::new(id, config, self.simulator.clone(), renderer)
    }

    pub fn create_ref(&self) -> NodeRef {
        let id = self.next_ref.get();
        self.next_ref.set(id + 1);
        NodeRef(id)
    }

    pub fn run_task<F, R>(&self, body: F) -> Result<TaskId, HarnessError>
    where
        F: FnOnce() -> R,
        R: TaskOutcome,
    {
        self.scheduler.run_task(body)
    }

    pub fn run_task_async<F, R>(&self, body: F) -> Result<TaskId, HarnessError>
    where
        F: Future<Output = R> + 'static,
        R: TaskOutcome + 'static,
    {
        self.scheduler.run_task_async(body)
    }

    pub fn queue_microtask<F, R>(&self, f: F) -> Result<(), HarnessError>
    where
        F: FnOnce() -> R + 'static,
        R: TaskOutcome,
    {
        self.scheduler.queue_microtask(f)
    }

    pub fn run_on_ui_thread<T>(&self, body: impl FnOnce() -> T) -> T {
        self.simulator.run_on_ui_thread(body)
    }

    pub fn dispatch_native_event(
        &self,
        target: NodeRef,
        event_type: impl Into<String>,
        payload: Option<PropValue>,
        options: DispatchOptions,
    ) -> Result<u64, HarnessError> {
        self.simulator.dispatch_native_event(target, event_type, payload, options)
    }

    pub fn run_work_loop(&self) -> Result<WorkLoopReport, HarnessError> {
        self.simulator.run_work_loop()
    }

    pub fn pending_event_count(&self) -> usize {
        self.simulator.pending_event_count()
    }

    pub fn trace(&self) -> TraceLog {
        self.scheduler.trace()
    }
}
