//! Cooperative cancellation.
//!
//! An [`AbortController`] owns the right to abort; the [`AbortSignal`]s it
//! hands out only observe. Aborting never stops work by itself: operations
//! check the signal or register a listener and react on their own.

use crate::event_loop::{EventLoop, Scheduler};
use crate::task::Task;
use crate::task_queue::MicroTask;
use core_types::{JsError, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Listener = Box<dyn FnOnce(&Value)>;

#[derive(Default)]
struct SignalState {
    reason: Option<Value>,
    listeners: Vec<(u64, Listener)>,
    next_key: u64,
}

/// The observing side of a cancellation signal.
///
/// Clones share state. Once aborted, a signal stays aborted with the same
/// reason.
#[derive(Clone)]
pub struct AbortSignal {
    state: Rc<RefCell<SignalState>>,
    scheduler: Scheduler,
}

impl AbortSignal {
    fn new(scheduler: Scheduler) -> Self {
        Self {
            state: Rc::new(RefCell::new(SignalState::default())),
            scheduler,
        }
    }

    /// Returns a signal that aborts with a `TimeoutError` once `delay_ms` of
    /// loop time has passed.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_runtime::{AbortSignal, EventLoop};
    ///
    /// let event_loop = EventLoop::new();
    /// let signal = AbortSignal::timeout(&event_loop, 50);
    /// assert!(!signal.aborted());
    ///
    /// event_loop.run_until_done().unwrap();
    /// assert!(signal.aborted());
    /// assert_eq!(event_loop.now(), 50);
    /// ```
    pub fn timeout(event_loop: &EventLoop, delay_ms: u64) -> Self {
        let signal = Self::new(event_loop.scheduler());
        let timed_out = signal.clone();
        event_loop.set_timeout(delay_ms, move || {
            timed_out.fire(JsError::timeout().into());
        });
        signal
    }

    /// Returns true once the signal has been aborted.
    pub fn aborted(&self) -> bool {
        self.state.borrow().reason.is_some()
    }

    /// The abort reason, if aborted.
    pub fn reason(&self) -> Option<Value> {
        self.state.borrow().reason.clone()
    }

    /// Returns the abort reason as an error if the signal has been aborted.
    pub fn throw_if_aborted(&self) -> Result<(), Value> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Registers a listener that runs once with the abort reason.
    ///
    /// Listeners registered before the abort run synchronously inside
    /// [`AbortController::abort`], in registration order. A listener
    /// registered on an already-aborted signal runs on the next microtask.
    pub fn on_abort<F>(&self, listener: F)
    where
        F: FnOnce(&Value) + 'static,
    {
        self.add_listener(Box::new(listener));
    }

    /// Number of listeners still waiting for the abort.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Queues `listener`, or schedules it if the signal is already aborted.
    /// Returns the key needed to remove a queued listener.
    fn add_listener(&self, listener: Listener) -> Option<u64> {
        let reason = {
            let mut state = self.state.borrow_mut();
            match state.reason.clone() {
                Some(reason) => reason,
                None => {
                    let key = state.next_key;
                    state.next_key += 1;
                    state.listeners.push((key, listener));
                    return Some(key);
                }
            }
        };
        self.scheduler
            .schedule(MicroTask::from_fn(move || listener(&reason)));
        None
    }

    fn remove_listener(&self, key: u64) {
        let removed = {
            let mut state = self.state.borrow_mut();
            let index = state.listeners.iter().position(|(k, _)| *k == key);
            index.map(|index| state.listeners.remove(index))
        };
        // The listener may hold the last handle to a task; drop it unborrowed.
        drop(removed);
    }

    /// Returns a task that mirrors `task` but rejects with the abort reason
    /// as soon as this signal is aborted.
    ///
    /// The underlying work is not stopped; its eventual outcome is observed
    /// and discarded. Once `task` settles, the abort listener is removed.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_runtime::{AbortController, EventLoop, Task};
    ///
    /// let event_loop = EventLoop::new();
    /// let controller = AbortController::new(&event_loop);
    /// let (work, _resolver) = Task::<i32>::with_resolvers(&event_loop);
    ///
    /// let bound = controller.signal().bind(&work);
    /// controller.abort(None);
    ///
    /// let err = event_loop.block_on(&bound).unwrap_err();
    /// assert_eq!(
    ///     err.reason().unwrap().to_string(),
    ///     "AbortError: This operation was aborted"
    /// );
    /// ```
    pub fn bind<T: Clone + 'static>(&self, task: &Task<T>) -> Task<T> {
        let (bound, resolver) = Task::pending(self.scheduler.clone());
        let registration = match self.reason() {
            Some(reason) => {
                resolver.reject(reason);
                None
            }
            None => {
                let on_abort = resolver.clone();
                self.add_listener(Box::new(move |reason: &Value| {
                    on_abort.reject(reason.clone())
                }))
                .map(|key| (self.clone(), key))
            }
        };
        task.subscribe(move |outcome| {
            resolver.settle_outcome(outcome);
            if let Some((signal, key)) = registration {
                signal.remove_listener(key);
            }
        });
        bound
    }

    /// Aborts the signal. Returns false if it was already aborted.
    fn fire(&self, reason: Value) -> bool {
        let listeners = {
            let mut state = self.state.borrow_mut();
            if state.reason.is_some() {
                return false;
            }
            state.reason = Some(reason.clone());
            std::mem::take(&mut state.listeners)
        };

        tracing::debug!(%reason, listeners = listeners.len(), "signal aborted");
        for (_, listener) in listeners {
            listener(&reason);
        }
        true
    }
}

impl fmt::Debug for AbortSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("AbortSignal")
                .field("reason", &state.reason)
                .field("listeners", &state.listeners.len())
                .finish(),
            Err(_) => f.write_str("AbortSignal { <borrowed> }"),
        }
    }
}

/// The aborting side of a cancellation signal.
///
/// # Examples
///
/// ```
/// use async_runtime::{AbortController, EventLoop};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let controller = AbortController::new(&event_loop);
/// let signal = controller.signal();
///
/// assert!(controller.abort(Some(Value::from("stop"))));
/// assert!(!controller.abort(None));
/// assert_eq!(signal.reason(), Some(Value::from("stop")));
/// ```
#[derive(Debug)]
pub struct AbortController {
    signal: AbortSignal,
}

impl AbortController {
    /// Creates a controller with a fresh, un-aborted signal.
    pub fn new(event_loop: &EventLoop) -> Self {
        Self {
            signal: AbortSignal::new(event_loop.scheduler()),
        }
    }

    /// A handle to the controller's signal.
    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    /// Aborts the signal with `reason`, or an `AbortError` if none is given.
    ///
    /// Listeners run before this returns. Aborting twice is a no-op that
    /// returns false and keeps the first reason.
    pub fn abort(&self, reason: Option<Value>) -> bool {
        let reason = reason.unwrap_or_else(|| JsError::abort().into());
        self.signal.fire(reason)
    }
}
