use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use crate::config::HarnessConfig;
use crate::error::{BoxError, ErrorOrigin, HarnessError};
use crate::trace::{TraceEvent, TraceLog};

pub type TaskId = u64;

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Idle,
    RunningBody,
    DrainingMicrotasks,
}

/// Return types accepted from task bodies, microtasks and handlers.
pub trait TaskOutcome {
    fn into_result(self) -> Result<(), BoxError>;
}

impl TaskOutcome for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> TaskOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

type Microtask = Box<dyn FnOnce() -> Result<(), BoxError>>;
type LocalFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>>>>;

enum QueueEntry {
    Microtask(Microtask),
    /// Poll the active task's async body again.
    Resume,
}

struct WakeFlag {
    woken: AtomicBool,
}

impl futures_task::ArcWake for WakeFlag {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.store(true, Ordering::SeqCst);
    }
}

struct AsyncBody {
    future: LocalFuture,
    wake: Arc<WakeFlag>,
    waker: Waker,
}

/// Run-to-completion task scheduler with a microtask queue.
///
/// Cloning yields another handle to the same scheduler. Only one task may be
/// active at a time; a task ends when its body and every microtask it
/// transitively queued have run.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

struct SchedulerInner {
    config: HarnessConfig,
    active: Cell<Option<TaskId>>,
    phase: Cell<TaskPhase>,
    queue: RefCell<VecDeque<QueueEntry>>,
    async_body: RefCell<Option<AsyncBody>>,
    next_task_id: Cell<TaskId>,
    ran: Cell<usize>,
    trace: RefCell<TraceLog>,
}

/// Returns the scheduler to Idle on every exit path, unwinding included.
struct TaskGuard<'a> {
    inner: &'a SchedulerInner,
    id: TaskId,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        let leftover: Vec<QueueEntry> = self.inner.queue.borrow_mut().drain(..).collect();
        let body = self.inner.async_body.borrow_mut().take();
        if !leftover.is_empty() {
            log::debug!("task #{} discarded {} queued microtasks", self.id, leftover.len());
        }
        drop(leftover);
        drop(body);
        self.inner.active.set(None);
        self.inner.phase.set(TaskPhase::Idle);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(HarnessConfig::default())
    }
}

impl Scheduler {
    pub fn new(config: HarnessConfig) -> Self {
        Scheduler {
            inner: Rc::new(SchedulerInner {
                config,
                active: Cell::new(None),
                phase: Cell::new(TaskPhase::Idle),
                queue: RefCell::new(VecDeque::new()),
                async_body: RefCell::new(None),
                next_task_id: Cell::new(1),
                ran: Cell::new(0),
                trace: RefCell::new(TraceLog::new()),
            }),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.inner.config
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.get().is_some()
    }

    pub fn active_task(&self) -> Option<TaskId> {
        self.inner.active.get()
    }

    pub fn phase(&self) -> TaskPhase {
        self.inner.phase.get()
    }

    pub fn pending_microtasks(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Run `body` as a task and drain its microtasks before returning.
    pub fn run_task<F, R>(&self, body: F) -> Result<TaskId, HarnessError>
    where
        F: FnOnce() -> R,
        R: TaskOutcome,
    {
        self.run_with(ErrorOrigin::Body, body)
    }

    pub(crate) fn run_with<F, R>(&self, origin: ErrorOrigin, body: F) -> Result<TaskId, HarnessError>
    where
        F: FnOnce() -> R,
        R: TaskOutcome,
    {
        let guard = self.begin()?;
        let task = guard.id;

        let result = body()
            .into_result()
            .map_err(|source| self.propagated(task, origin, source))
            .and_then(|()| self.drain(task));

        self.finish(task, &result);
        drop(guard);
        result.map(|()| task)
    }

    /// Run a future as a task. Every wake queues a resume continuation, so
    /// awaiting an already-resolved value continues within the same drain.
    pub fn run_task_async<F, R>(&self, body: F) -> Result<TaskId, HarnessError>
    where
        F: Future<Output = R> + 'static,
        R: TaskOutcome + 'static,
    {
        let guard = self.begin()?;
        let task = guard.id;

        let wake = Arc::new(WakeFlag {
            woken: AtomicBool::new(false),
        });
        let waker = futures_task::waker(wake.clone());
        let future: LocalFuture = Box::pin(async move { body.await.into_result() });
        *self.inner.async_body.borrow_mut() = Some(AsyncBody { future, wake, waker });

        let result = self.poll_async(task).and_then(|()| self.drain(task));

        self.finish(task, &result);
        drop(guard);
        result.map(|()| task)
    }

    /// Append `f` to the active task's microtask queue.
    pub fn queue_microtask<F, R>(&self, f: F) -> Result<(), HarnessError>
    where
        F: FnOnce() -> R + 'static,
        R: TaskOutcome,
    {
        let task = self
            .inner
            .active
            .get()
            .ok_or(HarnessError::NoActiveTask("queue_microtask requires an active task"))?;

        let queued = {
            let mut queue = self.inner.queue.borrow_mut();
            queue.push_back(QueueEntry::Microtask(Box::new(move || f().into_result())));
            queue.len()
        };
        log::trace!("task #{task} queued microtask ({queued} pending)");
        self.record(TraceEvent::MicrotaskQueued { task, queued });
        Ok(())
    }

    /// Snapshot of the trace log.
    pub fn trace(&self) -> TraceLog {
        self.inner.trace.borrow().clone()
    }

    pub fn clear_trace(&self) {
        self.inner.trace.borrow_mut().clear();
    }

    pub(crate) fn record(&self, event: TraceEvent) {
        if self.inner.config.trace {
            self.inner.trace.borrow_mut().record(event);
        }
    }

    fn begin(&self) -> Result<TaskGuard<'_>, HarnessError> {
        if let Some(active) = self.inner.active.get() {
            log::warn!("rejected reentrant task while task #{active} is active");
            self.record(TraceEvent::TaskRejected { active });
            return Err(HarnessError::Reentrancy { active });
        }

        let id = self.inner.next_task_id.get();
        self.inner.next_task_id.set(id + 1);
        self.inner.active.set(Some(id));
        self.inner.phase.set(TaskPhase::RunningBody);
        self.inner.ran.set(0);

        log::debug!("task #{id} started");
        self.record(TraceEvent::TaskStarted { task: id });
        Ok(TaskGuard {
            inner: &self.inner,
            id,
        })
    }

    /// Exhaust the queue to fixpoint, including entries queued while draining.
    fn drain(&self, task: TaskId) -> Result<(), HarnessError> {
        self.inner.phase.set(TaskPhase::DrainingMicrotasks);

        loop {
            self.promote_wake();
            let entry = self.inner.queue.borrow_mut().pop_front();
            let entry = match entry {
                Some(entry) => entry,
                None => break,
            };

            let ran = self.inner.ran.get() + 1;
            let limit = self.inner.config.max_microtasks_per_task;
            if ran > limit {
                return Err(HarnessError::MicrotaskLimitExceeded { task, limit });
            }
            self.inner.ran.set(ran);

            match entry {
                QueueEntry::Microtask(f) => {
                    self.record(TraceEvent::MicrotaskRan { task });
                    f().map_err(|source| self.propagated(task, ErrorOrigin::Microtask, source))?;
                }
                QueueEntry::Resume => {
                    self.record(TraceEvent::TaskResumed { task });
                    self.poll_async(task)?;
                }
            }
        }

        if self.inner.async_body.borrow().is_some() {
            return Err(HarnessError::Stalled(task));
        }
        Ok(())
    }

    /// A wake observed since the last step becomes a resume at the queue tail.
    fn promote_wake(&self) {
        let woken = match self.inner.async_body.borrow().as_ref() {
            Some(body) => body.wake.woken.swap(false, Ordering::SeqCst),
            None => false,
        };
        if woken {
            self.inner.queue.borrow_mut().push_back(QueueEntry::Resume);
        }
    }

    fn poll_async(&self, task: TaskId) -> Result<(), HarnessError> {
        // The slot stays empty while polling so the body may use the scheduler.
        let body = self.inner.async_body.borrow_mut().take();
        let mut body = match body {
            Some(body) => body,
            None => return Ok(()),
        };

        let mut cx = Context::from_waker(&body.waker);
        match body.future.as_mut().poll(&mut cx) {
            Poll::Ready(result) => {
                result.map_err(|source| self.propagated(task, ErrorOrigin::Body, source))
            }
            Poll::Pending => {
                *self.inner.async_body.borrow_mut() = Some(body);
                Ok(())
            }
        }
    }

    fn propagated(&self, task: TaskId, origin: ErrorOrigin, source: BoxError) -> HarnessError {
        log::debug!("task #{task}: {origin} returned an error: {source}");
        HarnessError::PropagatedBody { task, origin, source }
    }

    fn finish(&self, task: TaskId, result: &Result<(), HarnessError>) {
        match result {
            Ok(()) => {
                let microtasks = self.inner.ran.get();
                log::debug!("task #{task} completed after {microtasks} microtasks");
                self.record(TraceEvent::TaskCompleted { task, microtasks });
            }
            Err(e) => {
                log::warn!("task #{task} failed: {e}");
                self.record(TraceEvent::TaskFailed {
                    task,
                    error: e.to_string(),
                });
            }
        }
    }
}
