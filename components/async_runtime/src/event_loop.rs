//! Event loop implementation.
//!
//! This module provides the single-threaded run loop that drives tasks. It owns
//! the macrotask queue, the microtask queue and the timer queue, and the clock
//! the timers are measured against.

use crate::config::{ClockMode, EventLoopConfig};
use crate::diagnostics::{Diagnostics, UnhandledRejection};
use crate::error::AwaitError;
use crate::task::{Outcome, Task};
use crate::task_queue::{Macrotask, MicroTask, MicrotaskQueue, TaskQueue, TimerId, TimerQueue};
use core_types::JsError;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

struct LoopInner {
    config: EventLoopConfig,
    task_queue: RefCell<TaskQueue>,
    microtask_queue: RefCell<MicrotaskQueue>,
    timers: RefCell<TimerQueue>,
    virtual_now: Cell<u64>,
    started: Instant,
    diagnostics: Diagnostics,
}

/// The event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Drains all microtasks queued so far
/// 2. Runs the oldest macrotask, or else the earliest due timer
/// 3. Drains all microtasks again
/// 4. Repeats
///
/// When nothing is runnable but timers remain, a [`ClockMode::Virtual`] loop
/// jumps its clock to the next deadline; a [`ClockMode::Wall`] loop sleeps.
///
/// `EventLoop` is a cheap handle: clones share the same queues.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Macrotask, MicroTask};
///
/// let event_loop = EventLoop::new();
///
/// event_loop.enqueue_task(Macrotask::new(|| Ok(())));
/// event_loop.enqueue_microtask(MicroTask::new(|| Ok(())));
/// event_loop.run_until_done().unwrap();
/// assert!(!event_loop.has_pending_work());
/// ```
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<LoopInner>,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues and the default configuration.
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    /// Creates a new EventLoop with the given configuration.
    pub fn with_config(config: EventLoopConfig) -> Self {
        tracing::debug!(clock = ?config.clock, "event loop created");
        Self {
            inner: Rc::new(LoopInner {
                config,
                task_queue: RefCell::new(TaskQueue::new()),
                microtask_queue: RefCell::new(MicrotaskQueue::new()),
                timers: RefCell::new(TimerQueue::new()),
                virtual_now: Cell::new(0),
                started: Instant::now(),
                diagnostics: Diagnostics::default(),
            }),
        }
    }

    /// The configuration this loop was created with.
    pub fn config(&self) -> &EventLoopConfig {
        &self.inner.config
    }

    /// Current loop time in milliseconds since the loop was created.
    pub fn now(&self) -> u64 {
        match self.inner.config.clock {
            ClockMode::Virtual => self.inner.virtual_now.get(),
            ClockMode::Wall => self.inner.started.elapsed().as_millis() as u64,
        }
    }

    /// Adds a macrotask to the task queue.
    pub fn enqueue_task(&self, task: Macrotask) {
        self.inner.task_queue.borrow_mut().enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    ///
    /// The microtask will be executed after the current macrotask completes.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.inner.microtask_queue.borrow_mut().enqueue(microtask);
    }

    /// Queues an infallible callback as a microtask.
    pub fn queue_microtask<F>(&self, f: F)
    where
        F: FnOnce() + 'static,
    {
        self.enqueue_microtask(MicroTask::from_fn(f));
    }

    /// Runs `f` once at least `delay_ms` of loop time has passed.
    ///
    /// Timers fire in deadline order; timers with the same deadline fire in
    /// the order they were scheduled.
    pub fn set_timeout<F>(&self, delay_ms: u64, f: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let deadline = self.now().saturating_add(delay_ms);
        let id = self.inner.timers.borrow_mut().schedule(
            deadline,
            Macrotask::new(move || {
                f();
                Ok(())
            }),
        );
        tracing::trace!(timer = %id, delay_ms, deadline, "timer scheduled");
        id
    }

    /// Cancels a timer. Returns false if it already fired or was cleared.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let cancelled = self.inner.timers.borrow_mut().cancel(id);
        let cleared = cancelled.is_some();
        // The callback may own the last handle to a rejected task, so it is
        // dropped only after the timer borrow is released.
        drop(cancelled);
        tracing::trace!(timer = %id, cleared, "timer cleared");
        cleared
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.inner.task_queue.borrow().is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.inner.microtask_queue.borrow().is_empty()
    }

    /// Number of timers that have not fired yet.
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Returns true if any macrotask, microtask or timer is queued.
    pub fn has_pending_work(&self) -> bool {
        !self.is_task_queue_empty() || !self.is_microtask_queue_empty() || self.pending_timers() > 0
    }

    /// Runs the event loop until all tasks, microtasks and timers are processed.
    ///
    /// # Returns
    ///
    /// `Ok(())` once no work remains, or the first error raised by a
    /// macrotask or microtask.
    pub fn run_until_done(&self) -> Result<(), JsError> {
        loop {
            let ran = self.process_one_cycle()?;
            if !ran && !self.has_pending_work() {
                return Ok(());
            }
        }
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// New microtasks added during execution are also processed before this
    /// method returns. Draining more than
    /// [`max_microtasks_per_turn`](EventLoopConfig::max_microtasks_per_turn)
    /// microtasks fails with an `InternalError`.
    pub fn run_all_microtasks(&self) -> Result<(), JsError> {
        let limit = self.inner.config.max_microtasks_per_turn;
        let mut drained = 0usize;
        while let Some(microtask) = self.next_microtask() {
            drained += 1;
            if drained > limit {
                return Err(JsError::internal(format!(
                    "microtask queue did not drain after {} microtasks",
                    limit
                )));
            }
            microtask.run()?;
        }
        if drained > 0 {
            tracing::trace!(drained, "microtasks drained");
        }
        Ok(())
    }

    /// Runs all queued macrotasks (without processing microtasks between them).
    ///
    /// This is primarily for testing purposes.
    pub fn run_all_tasks(&self) -> Result<(), JsError> {
        while let Some(task) = self.next_task() {
            task.run()?;
        }
        Ok(())
    }

    /// Processes one complete cycle: pending microtasks, then one macrotask
    /// or due timer, then all microtasks.
    ///
    /// Returns true if a macrotask or timer ran.
    pub fn process_one_cycle(&self) -> Result<bool, JsError> {
        self.run_all_microtasks()?;

        let ran = if let Some(task) = self.next_task() {
            task.run()?;
            true
        } else if let Some((id, timer)) = self.next_timer() {
            tracing::trace!(timer = %id, now = self.now(), "timer fired");
            timer.run()?;
            true
        } else {
            false
        };

        self.run_all_microtasks()?;
        Ok(ran)
    }

    /// Turns the loop until `task` settles and returns its value.
    ///
    /// Awaiting registers a continuation on the task, so a rejection observed
    /// here counts as handled. A rejection is re-raised as
    /// [`AwaitError::Rejected`]; if the loop runs out of work first the result
    /// is [`AwaitError::Stalled`].
    ///
    /// # Examples
    ///
    /// ```
    /// use async_runtime::{EventLoop, Task};
    ///
    /// let event_loop = EventLoop::new();
    /// let task = Task::resolved(&event_loop, 42);
    /// assert_eq!(event_loop.block_on(&task).unwrap(), 42);
    /// ```
    pub fn block_on<T>(&self, task: &Task<T>) -> Result<T, AwaitError>
    where
        T: Clone + 'static,
    {
        let slot: Rc<Cell<Option<Outcome<T>>>> = Rc::new(Cell::new(None));
        let filled = slot.clone();
        task.subscribe(move |outcome| filled.set(Some(outcome)));

        loop {
            if let Some(outcome) = slot.take() {
                return outcome.into_result().map_err(AwaitError::Rejected);
            }
            let ran = self.process_one_cycle()?;
            if !ran && !self.has_pending_work() {
                return match slot.take() {
                    Some(outcome) => outcome.into_result().map_err(AwaitError::Rejected),
                    None => {
                        tracing::debug!(task = %task.id(), "loop stalled with task pending");
                        Err(AwaitError::Stalled)
                    }
                };
            }
        }
    }

    /// Installs a callback invoked for every unhandled rejection, in addition
    /// to the default `tracing` warning.
    pub fn set_rejection_sink<F>(&self, sink: F)
    where
        F: Fn(&UnhandledRejection) + 'static,
    {
        self.inner.diagnostics.set_sink(Rc::new(sink));
    }

    /// Unhandled rejections reported so far.
    pub fn unhandled_rejections(&self) -> Vec<UnhandledRejection> {
        self.inner.diagnostics.reports()
    }

    /// Returns and clears the unhandled rejections reported so far.
    pub fn take_unhandled_rejections(&self) -> Vec<UnhandledRejection> {
        self.inner.diagnostics.take_reports()
    }

    pub(crate) fn scheduler(&self) -> Scheduler {
        Scheduler {
            event_loop: Rc::downgrade(&self.inner),
            diagnostics: self.inner.diagnostics.clone(),
        }
    }

    fn next_microtask(&self) -> Option<MicroTask> {
        self.inner.microtask_queue.borrow_mut().dequeue()
    }

    fn next_task(&self) -> Option<Macrotask> {
        self.inner.task_queue.borrow_mut().dequeue()
    }

    fn next_timer(&self) -> Option<(TimerId, Macrotask)> {
        let deadline = self.inner.timers.borrow().next_deadline()?;
        let now = self.now();
        if deadline > now {
            match self.inner.config.clock {
                ClockMode::Virtual => self.inner.virtual_now.set(deadline),
                ClockMode::Wall => std::thread::sleep(Duration::from_millis(deadline - now)),
            }
        }
        let now = self.now();
        self.inner.timers.borrow_mut().pop_due(now)
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("now", &self.now())
            .field("tasks", &self.inner.task_queue.borrow().len())
            .field("microtasks", &self.inner.microtask_queue.borrow().len())
            .field("timers", &self.inner.timers.borrow().len())
            .finish()
    }
}

/// The handle tasks and signals keep to their loop.
///
/// Holds the loop weakly: queued reactions own tasks, and tasks must not keep
/// the queues that own them alive. Reactions scheduled after the loop is gone
/// are discarded.
#[derive(Clone)]
pub(crate) struct Scheduler {
    event_loop: Weak<LoopInner>,
    diagnostics: Diagnostics,
}

impl Scheduler {
    pub(crate) fn schedule(&self, microtask: MicroTask) {
        match self.event_loop.upgrade() {
            Some(inner) => inner.microtask_queue.borrow_mut().enqueue(microtask),
            None => tracing::trace!("event loop dropped; discarding microtask"),
        }
    }

    pub(crate) fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}
