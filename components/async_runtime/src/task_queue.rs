//! Task, microtask and timer queue management.
//!
//! This module provides the queues used by the event loop. Macrotasks are
//! executed one at a time, with all microtasks draining after each one. Timers
//! become macrotasks once their deadline is reached.

use core_types::JsError;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

type Callback = Box<dyn FnOnce() -> Result<(), JsError>>;

/// A macrotask to be executed by the event loop.
///
/// Macrotasks represent work for a later iteration of the loop, such as timer
/// callbacks or host I/O completions.
pub struct Macrotask {
    callback: Callback,
}

impl Macrotask {
    /// Creates a new Macrotask from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), JsError> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the macrotask.
    pub fn run(self) -> Result<(), JsError> {
        (self.callback)()
    }
}

impl fmt::Debug for Macrotask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Macrotask {{ ... }}")
    }
}

/// A microtask to be executed by the event loop.
///
/// Microtasks are executed after each macrotask. Task reactions and late abort
/// listeners are always delivered as microtasks.
pub struct MicroTask {
    callback: Callback,
}

impl MicroTask {
    /// Creates a new MicroTask from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), JsError> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Creates a MicroTask from a closure that cannot fail.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self::new(move || {
            f();
            Ok(())
        })
    }

    /// Executes the microtask.
    pub fn run(self) -> Result<(), JsError> {
        (self.callback)()
    }
}

impl fmt::Debug for MicroTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MicroTask {{ ... }}")
    }
}

/// A queue for macrotasks.
///
/// Macrotasks are processed in FIFO order, one at a time.
#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: VecDeque<Macrotask>,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a macrotask to the end of the queue.
    pub fn enqueue(&mut self, task: Macrotask) {
        self.queue.push_back(task);
    }

    /// Removes and returns the next macrotask from the queue.
    pub fn dequeue(&mut self) -> Option<Macrotask> {
        self.queue.pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of macrotasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// A queue for microtasks.
///
/// Microtasks are drained completely after each macrotask.
#[derive(Debug, Default)]
pub struct MicrotaskQueue {
    queue: VecDeque<MicroTask>,
}

impl MicrotaskQueue {
    /// Creates a new empty MicrotaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a microtask to the end of the queue.
    pub fn enqueue(&mut self, microtask: MicroTask) {
        self.queue.push_back(microtask);
    }

    /// Removes and returns the next microtask from the queue.
    pub fn dequeue(&mut self) -> Option<MicroTask> {
        self.queue.pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of microtasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Identifies a scheduled timer so it can be cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Timers ordered by deadline, then by registration order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: BTreeMap<(u64, TimerId), Macrotask>,
    next_id: u64,
}

impl TimerQueue {
    /// Creates a new empty TimerQueue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `task` to become runnable at `deadline_ms`.
    pub fn schedule(&mut self, deadline_ms: u64, task: Macrotask) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert((deadline_ms, id), task);
        id
    }

    /// Removes a timer and hands back its callback. Returns `None` if it
    /// already fired or was never scheduled.
    pub fn cancel(&mut self, id: TimerId) -> Option<Macrotask> {
        let key = *self.timers.keys().find(|(_, timer)| *timer == id)?;
        self.timers.remove(&key)
    }

    /// Deadline of the earliest timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Removes and returns the earliest timer if its deadline is at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerId, Macrotask)> {
        let key = *self.timers.keys().next()?;
        if key.0 > now_ms {
            return None;
        }
        self.timers.remove(&key).map(|task| (key.1, task))
    }

    /// Returns true if no timers are scheduled.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Returns the number of scheduled timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }
}
