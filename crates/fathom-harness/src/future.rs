//! Awaitables for async task bodies.
//!
//! Both resolve through the scheduler's microtask queue: nothing here ever
//! waits on real time.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Suspend once and resume on the next turn of the microtask queue,
/// like awaiting an already-resolved value.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

struct DeferredState<T> {
    value: Option<T>,
    waker: Option<Waker>,
    resolved: bool,
}

/// One-shot value settled later by a [`Resolver`], typically from a microtask.
pub struct Deferred<T> {
    state: Rc<RefCell<DeferredState<T>>>,
}

pub struct Resolver<T> {
    state: Rc<RefCell<DeferredState<T>>>,
}

/// Create a linked resolver / deferred pair.
pub fn deferred<T>() -> (Resolver<T>, Deferred<T>) {
    let state = Rc::new(RefCell::new(DeferredState {
        value: None,
        waker: None,
        resolved: false,
    }));
    (
        Resolver {
            state: state.clone(),
        },
        Deferred { state },
    )
}

impl<T> Resolver<T> {
    pub fn resolve(self, value: T) {
        let waker = {
            let mut state = self.state.borrow_mut();
            state.value = Some(value);
            state.resolved = true;
            state.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl<T> Deferred<T> {
    pub fn is_resolved(&self) -> bool {
        self.state.borrow().resolved
    }
}

impl<T> Future for Deferred<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = self.state.borrow_mut();
        match state.value.take() {
            Some(value) => Poll::Ready(value),
            None => {
                state.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}
