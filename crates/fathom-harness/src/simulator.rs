use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use fathom_tree::PropValue;

use crate::error::{ErrorOrigin, HarnessError};
use crate::event::{DispatchOptions, EventHandler, NativeEvent, NodeRef, SyntheticEvent};
use crate::scheduler::Scheduler;
use crate::trace::TraceEvent;

/// Outcome of one work-loop pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkLoopReport {
    pub delivered: usize,
    /// Events whose target had no handler for their type.
    pub skipped: usize,
}

/// Two-queue model of a UI producer and a logic-side consumer.
///
/// Events dispatched on the UI side land in the pending queue. A work-loop
/// pass moves the whole pending queue into the dispatch batch and delivers
/// each event in its own task.
#[derive(Clone)]
pub struct EventSimulator {
    inner: Rc<SimulatorInner>,
}

struct SimulatorInner {
    scheduler: Scheduler,
    pending: RefCell<VecDeque<NativeEvent>>,
    batch: RefCell<VecDeque<NativeEvent>>,
    ui_depth: Cell<usize>,
    next_sequence: Cell<u64>,
    handlers: RefCell<BTreeMap<(NodeRef, String), EventHandler>>,
}

struct UiThreadGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for UiThreadGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

impl EventSimulator {
    pub fn new(scheduler: Scheduler) -> Self {
        EventSimulator {
            inner: Rc::new(SimulatorInner {
                scheduler,
                pending: RefCell::new(VecDeque::new()),
                batch: RefCell::new(VecDeque::new()),
                ui_depth: Cell::new(0),
                next_sequence: Cell::new(1),
                handlers: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn is_on_ui_thread(&self) -> bool {
        self.inner.ui_depth.get() > 0
    }

    /// Run `body` on the simulated UI thread. Dispatches inside it only queue.
    pub fn run_on_ui_thread<T>(&self, body: impl FnOnce() -> T) -> T {
        let depth = &self.inner.ui_depth;
        depth.set(depth.get() + 1);
        let _guard = UiThreadGuard { depth };
        body()
    }

    /// Queue a native event and return its sequence number.
    ///
    /// Outside `run_on_ui_thread` and with no task active the event is
    /// delivered right away by a work-loop pass.
    pub fn dispatch_native_event(
        &self,
        target: NodeRef,
        event_type: impl Into<String>,
        payload: Option<PropValue>,
        options: DispatchOptions,
    ) -> Result<u64, HarnessError> {
        let on_ui = self.is_on_ui_thread();
        if !on_ui && self.inner.scheduler.is_active() {
            return Err(HarnessError::InvalidCallContext(
                "dispatch_native_event from an active task must run on the UI thread",
            ));
        }

        let sequence = self.inner.next_sequence.get();
        self.inner.next_sequence.set(sequence + 1);
        self.enqueue(NativeEvent {
            sequence,
            target,
            event_type: event_type.into(),
            payload,
            is_unique: options.is_unique,
        });

        if !on_ui {
            self.run_work_loop()?;
        }
        Ok(sequence)
    }

    fn enqueue(&self, event: NativeEvent) {
        self.inner.scheduler.record(TraceEvent::EventDispatched {
            sequence: event.sequence,
            target: event.target.0,
            event_type: event.event_type.clone(),
            unique: event.is_unique,
        });

        let mut pending = self.inner.pending.borrow_mut();
        if event.is_unique {
            if let Some(pos) = pending.iter().rposition(|e| e.coalesces_with(&event)) {
                if let Some(replaced) = pending.remove(pos) {
                    log::trace!(
                        "event #{} coalesced into #{} ({} on {})",
                        replaced.sequence,
                        event.sequence,
                        event.event_type,
                        event.target
                    );
                    self.inner.scheduler.record(TraceEvent::EventCoalesced {
                        replaced: replaced.sequence,
                        by: event.sequence,
                    });
                }
            }
        }
        pending.push_back(event);
    }

    /// Deliver every currently pending event, each in its own task.
    ///
    /// A handler error stops the pass; the undelivered rest of the batch
    /// goes back to the front of the pending queue.
    pub fn run_work_loop(&self) -> Result<WorkLoopReport, HarnessError> {
        if self.inner.scheduler.is_active() {
            return Err(HarnessError::InvalidCallContext(
                "run_work_loop cannot run inside an active task",
            ));
        }
        if self.is_on_ui_thread() {
            return Err(HarnessError::InvalidCallContext(
                "run_work_loop cannot run inside run_on_ui_thread",
            ));
        }

        let size = {
            let mut pending = self.inner.pending.borrow_mut();
            let mut batch = self.inner.batch.borrow_mut();
            batch.extend(pending.drain(..));
            batch.len()
        };
        log::debug!("work loop: delivering {size} events");
        self.inner.scheduler.record(TraceEvent::WorkLoopStarted { batch: size });

        let mut report = WorkLoopReport::default();
        loop {
            let event = self.inner.batch.borrow_mut().pop_front();
            let event = match event {
                Some(event) => event,
                None => break,
            };

            let handler = self
                .inner
                .handlers
                .borrow()
                .get(&(event.target, event.event_type.clone()))
                .cloned();
            let handler = match handler {
                Some(handler) => handler,
                None => {
                    log::debug!("no `{}` handler on {}", event.event_type, event.target);
                    self.inner.scheduler.record(TraceEvent::EventSkipped {
                        sequence: event.sequence,
                    });
                    report.skipped += 1;
                    continue;
                }
            };

            let sequence = event.sequence;
            let synthetic = SyntheticEvent::from(event);
            match self.inner.scheduler.run_with(ErrorOrigin::Handler, || handler(&synthetic)) {
                Ok(task) => {
                    self.inner.scheduler.record(TraceEvent::EventDelivered { sequence, task });
                    report.delivered += 1;
                }
                Err(e) => {
                    self.requeue_batch();
                    return Err(e);
                }
            }
        }

        Ok(report)
    }

    fn requeue_batch(&self) {
        let mut batch = self.inner.batch.borrow_mut();
        if batch.is_empty() {
            return;
        }
        log::warn!("work loop aborted; {} events returned to the pending queue", batch.len());
        let mut pending = self.inner.pending.borrow_mut();
        while let Some(event) = batch.pop_back() {
            pending.push_front(event);
        }
    }

    pub fn pending_event_count(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    pub fn pending_events(&self) -> Vec<NativeEvent> {
        self.inner.pending.borrow().iter().cloned().collect()
    }

    /// Register `handler` for `event_type` on `target`, replacing any previous one.
    pub fn set_handler(
        &self,
        target: NodeRef,
        event_type: impl Into<String>,
        handler: EventHandler,
    ) -> Option<EventHandler> {
        self.inner
            .handlers
            .borrow_mut()
            .insert((target, event_type.into()), handler)
    }

    pub fn remove_handler(&self, target: NodeRef, event_type: &str) -> Option<EventHandler> {
        self.inner
            .handlers
            .borrow_mut()
            .remove(&(target, event_type.to_string()))
    }

    pub fn has_handler(&self, target: NodeRef, event_type: &str) -> bool {
        self.inner
            .handlers
            .borrow()
            .contains_key(&(target, event_type.to_string()))
    }
}
