//! Single-assignment asynchronous values.
//!
//! A [`Task`] starts out pending and settles exactly once, either fulfilled
//! with a value or rejected with a reason. Continuations registered on a task
//! never run inline: they are always delivered through the event loop's
//! microtask queue, whether the task settles later or has already settled.

use crate::diagnostics::UnhandledRejection;
use crate::event_loop::{EventLoop, Scheduler};
use crate::task_queue::MicroTask;
use core_types::{JsError, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier of a task, used in logs and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// The state of a Task.
///
/// Once settled (Fulfilled or Rejected), a Task cannot change state.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskState<T> {
    /// The initial state; the task is neither fulfilled nor rejected.
    Pending,
    /// The task has been fulfilled with a value.
    Fulfilled(T),
    /// The task has been rejected with a reason.
    Rejected(Value),
}

impl<T> TaskState<T> {
    /// Returns `true` if the task is no longer pending.
    pub fn is_settled(&self) -> bool {
        !matches!(self, TaskState::Pending)
    }

    /// The state's name: `"pending"`, `"fulfilled"` or `"rejected"`.
    pub fn name(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Fulfilled(_) => "fulfilled",
            TaskState::Rejected(_) => "rejected",
        }
    }
}

impl<T: Clone> TaskState<T> {
    fn outcome(&self) -> Option<Outcome<T>> {
        match self {
            TaskState::Pending => None,
            TaskState::Fulfilled(value) => Some(Outcome::Fulfilled(value.clone())),
            TaskState::Rejected(reason) => Some(Outcome::Rejected(reason.clone())),
        }
    }
}

impl<T> From<Outcome<T>> for TaskState<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Fulfilled(value) => TaskState::Fulfilled(value),
            Outcome::Rejected(reason) => TaskState::Rejected(reason),
        }
    }
}

/// How a task settled.
///
/// This is what continuations receive, and the element type of
/// [`all_settled`](crate::all_settled)'s result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// Fulfilled with a value
    Fulfilled(T),
    /// Rejected with a reason
    Rejected(Value),
}

impl<T> Outcome<T> {
    /// `"fulfilled"` or `"rejected"`.
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Fulfilled(_) => "fulfilled",
            Outcome::Rejected(_) => "rejected",
        }
    }

    /// Returns `true` if fulfilled.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled(_))
    }

    /// Returns `true` if rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    /// Converts into a `Result`, with the rejection reason as the error.
    pub fn into_result(self) -> Result<T, Value> {
        match self {
            Outcome::Fulfilled(value) => Ok(value),
            Outcome::Rejected(reason) => Err(reason),
        }
    }
}

impl<T> From<Result<T, Value>> for Outcome<T> {
    fn from(result: Result<T, Value>) -> Self {
        match result {
            Ok(value) => Outcome::Fulfilled(value),
            Err(reason) => Outcome::Rejected(reason),
        }
    }
}

/// What a task is resolved with: a plain value, or another task whose
/// outcome it adopts. Resolving with a task flattens it, so there are no
/// tasks of tasks.
pub enum Resolution<T> {
    /// Fulfill with this value
    Value(T),
    /// Adopt this task's outcome once it settles
    Task(Task<T>),
}

impl<T> From<Task<T>> for Resolution<T> {
    fn from(task: Task<T>) -> Self {
        Resolution::Task(task)
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Resolution::Task(task) => f.debug_tuple("Task").field(&task.id()).finish(),
        }
    }
}

/// The result of an [`on_settle`](Task::on_settle) reaction: `Ok` settles the
/// derived task with the resolution, `Err` rejects it.
pub type Reaction<U> = Result<Resolution<U>, Value>;

type Continuation<T> = Box<dyn FnOnce(Outcome<T>)>;

struct TaskCell<T> {
    id: TaskId,
    state: TaskState<T>,
    continuations: Vec<Continuation<T>>,
    /// Set once any continuation is registered.
    handled: bool,
    /// Set on the first resolver call; later resolver calls are ignored even
    /// while an adopted task keeps this one pending.
    locked: bool,
    scheduler: Scheduler,
}

impl<T> Drop for TaskCell<T> {
    fn drop(&mut self) {
        if let TaskState::Rejected(reason) = &self.state {
            if !self.handled {
                self.scheduler.diagnostics().report(UnhandledRejection {
                    task: self.id,
                    reason: reason.clone(),
                });
            }
        }
    }
}

/// A single-assignment asynchronous value.
///
/// Cloning a `Task` clones the handle; all clones observe the same state.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let task = Task::new(&event_loop, |resolver| {
///     resolver.resolve(20_i32);
///     Ok(())
/// });
///
/// let doubled = task.then(|n| Ok(n * 2));
/// assert_eq!(event_loop.block_on(&doubled).unwrap(), 40);
///
/// let failed: Task<i32> = Task::rejected(&event_loop, "nope");
/// let recovered = failed.catch(|_| Ok(0));
/// assert_eq!(event_loop.block_on(&recovered).unwrap(), 0);
/// ```
pub struct Task<T> {
    cell: Rc<RefCell<TaskCell<T>>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Task");
        match self.cell.try_borrow() {
            Ok(cell) => s
                .field("id", &cell.id)
                .field("state", &cell.state.name())
                .field("continuations", &cell.continuations.len()),
            Err(_) => s.field("state", &"<borrowed>"),
        };
        s.finish()
    }
}

impl<T> Task<T> {
    /// The task's identifier.
    pub fn id(&self) -> TaskId {
        self.cell.borrow().id
    }

    /// Returns true while the task has not settled.
    pub fn is_pending(&self) -> bool {
        !self.cell.borrow().state.is_settled()
    }

    /// Returns true once the task has settled.
    pub fn is_settled(&self) -> bool {
        self.cell.borrow().state.is_settled()
    }

    /// Returns true once any continuation has been registered on the task.
    pub fn is_handled(&self) -> bool {
        self.cell.borrow().handled
    }

    /// Returns true if both handles refer to the same task.
    pub fn ptr_eq(&self, other: &Task<T>) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: Clone + 'static> Task<T> {
    /// Creates a task and runs `producer` synchronously with its resolver.
    ///
    /// If the producer returns `Err(reason)`, the task is rejected with that
    /// reason, unless the producer already settled it.
    pub fn new<F>(event_loop: &EventLoop, producer: F) -> Self
    where
        F: FnOnce(Resolver<T>) -> Result<(), Value>,
    {
        let (task, resolver) = Self::with_resolvers(event_loop);
        if let Err(reason) = producer(resolver.clone()) {
            resolver.reject(reason);
        }
        task
    }

    /// Creates a pending task and hands back its resolver.
    ///
    /// Used to bridge callback-based producers: whoever holds the resolver
    /// may settle the task.
    pub fn with_resolvers(event_loop: &EventLoop) -> (Self, Resolver<T>) {
        Self::pending(event_loop.scheduler())
    }

    /// Returns an already-fulfilled task.
    pub fn resolved(event_loop: &EventLoop, value: T) -> Self {
        let (task, resolver) = Self::with_resolvers(event_loop);
        resolver.resolve(value);
        task
    }

    /// Returns an already-rejected task.
    pub fn rejected(event_loop: &EventLoop, reason: impl Into<Value>) -> Self {
        let (task, resolver) = Self::with_resolvers(event_loop);
        resolver.reject(reason);
        task
    }

    /// Returns a task for `resolution`. A task is returned as-is; a value is
    /// wrapped in an already-fulfilled task.
    pub fn from_resolution(event_loop: &EventLoop, resolution: Resolution<T>) -> Self {
        match resolution {
            Resolution::Value(value) => Self::resolved(event_loop, value),
            Resolution::Task(task) => task,
        }
    }

    pub(crate) fn pending(scheduler: Scheduler) -> (Self, Resolver<T>) {
        let task = Self {
            cell: Rc::new(RefCell::new(TaskCell {
                id: TaskId::next(),
                state: TaskState::Pending,
                continuations: Vec::new(),
                handled: false,
                locked: false,
                scheduler,
            })),
        };
        let resolver = Resolver { task: task.clone() };
        (task, resolver)
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> TaskState<T> {
        self.cell.borrow().state.clone()
    }

    /// The outcome, if the task has settled.
    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.cell.borrow().state.outcome()
    }

    /// Registers reactions and returns the derived task they settle.
    ///
    /// Exactly one of the two reactions runs, on a later microtask. Returning
    /// `Ok` from either reaction settles the derived task with the resolution
    /// (so a rejection reaction can recover); returning `Err` rejects it.
    pub fn on_settle<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Task<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Reaction<U> + 'static,
        R: FnOnce(Value) -> Reaction<U> + 'static,
    {
        let (derived, resolver) = Task::<U>::pending(self.scheduler());
        self.subscribe(move |outcome| {
            let reaction = match outcome {
                Outcome::Fulfilled(value) => on_fulfilled(value),
                Outcome::Rejected(reason) => on_rejected(reason),
            };
            match reaction {
                Ok(resolution) => resolver.settle(resolution),
                Err(reason) => resolver.reject(reason),
            }
        });
        derived
    }

    /// Maps the fulfilled value; rejections pass through unchanged.
    pub fn then<U, F>(&self, f: F) -> Task<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<U, Value> + 'static,
    {
        self.on_settle(move |value| f(value).map(Resolution::Value), Err)
    }

    /// Chains a task-returning continuation, flattening the result.
    pub fn and_then<U, F>(&self, f: F) -> Task<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Task<U> + 'static,
    {
        self.on_settle(move |value| Ok(Resolution::Task(f(value))), Err)
    }

    /// Recovers from a rejection; fulfilled values pass through unchanged.
    pub fn catch<F>(&self, f: F) -> Task<T>
    where
        F: FnOnce(Value) -> Result<T, Value> + 'static,
    {
        self.on_settle(
            |value| Ok(Resolution::Value(value)),
            move |reason| f(reason).map(Resolution::Value),
        )
    }

    /// Runs `f` once the task settles either way; the derived task settles
    /// with the same outcome.
    pub fn finally<F>(&self, f: F) -> Task<T>
    where
        F: FnOnce() + 'static,
    {
        let (derived, resolver) = Task::pending(self.scheduler());
        self.subscribe(move |outcome| {
            f();
            resolver.settle_outcome(outcome);
        });
        derived
    }

    /// Registers a raw continuation and marks the task handled.
    ///
    /// If the task is still pending the continuation is queued behind earlier
    /// ones; otherwise it is scheduled as a microtask right away.
    pub(crate) fn subscribe<F>(&self, continuation: F)
    where
        F: FnOnce(Outcome<T>) + 'static,
    {
        let outcome = {
            let mut cell = self.cell.borrow_mut();
            cell.handled = true;
            match cell.state.outcome() {
                Some(outcome) => outcome,
                None => {
                    cell.continuations.push(Box::new(continuation));
                    return;
                }
            }
        };
        self.scheduler()
            .schedule(MicroTask::from_fn(move || continuation(outcome)));
    }

    /// Transitions out of `Pending`. Returns false if already settled.
    fn settle(&self, outcome: Outcome<T>) -> bool {
        let (id, continuations, scheduler) = {
            let mut cell = self.cell.borrow_mut();
            if cell.state.is_settled() {
                return false;
            }
            cell.state = outcome.clone().into();
            (
                cell.id,
                std::mem::take(&mut cell.continuations),
                cell.scheduler.clone(),
            )
        };

        tracing::trace!(
            task = %id,
            status = outcome.status(),
            continuations = continuations.len(),
            "task settled"
        );

        for continuation in continuations {
            let outcome = outcome.clone();
            scheduler.schedule(MicroTask::from_fn(move || continuation(outcome)));
        }
        true
    }

    /// Claims the right to resolve. Returns false if a resolver call already did.
    fn lock(&self) -> bool {
        let mut cell = self.cell.borrow_mut();
        if cell.locked || cell.state.is_settled() {
            return false;
        }
        cell.locked = true;
        true
    }

    fn scheduler(&self) -> Scheduler {
        self.cell.borrow().scheduler.clone()
    }
}

/// The settlement capability of a task.
///
/// The first call to any settling method wins; every later call is a no-op.
/// Cloning a resolver shares the capability.
pub struct Resolver<T> {
    task: Task<T>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            task: self.task.clone(),
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver").field("task", &self.task).finish()
    }
}

impl<T: Clone + 'static> Resolver<T> {
    /// Fulfills the task with `value`.
    pub fn resolve(&self, value: T) {
        if self.task.lock() {
            self.task.settle(Outcome::Fulfilled(value));
        }
    }

    /// Rejects the task with `reason`.
    pub fn reject(&self, reason: impl Into<Value>) {
        if self.task.lock() {
            self.task.settle(Outcome::Rejected(reason.into()));
        }
    }

    /// Resolves the task with another task: this task stays pending until
    /// `source` settles, then takes on its outcome.
    ///
    /// Adopting the task itself rejects it with a `TypeError`.
    pub fn adopt(&self, source: Task<T>) {
        if !self.task.lock() {
            return;
        }
        if source.ptr_eq(&self.task) {
            self.task.settle(Outcome::Rejected(
                JsError::type_error("chaining cycle detected for task").into(),
            ));
            return;
        }

        tracing::trace!(task = %self.task.id(), source = %source.id(), "adopting task");
        let target = self.task.clone();
        source.subscribe(move |outcome| {
            target.settle(outcome);
        });
    }

    /// Resolves with a value or adopts a task.
    pub fn settle(&self, resolution: Resolution<T>) {
        match resolution {
            Resolution::Value(value) => self.resolve(value),
            Resolution::Task(task) => self.adopt(task),
        }
    }

    /// Settles with an already-known outcome.
    pub fn settle_outcome(&self, outcome: Outcome<T>) {
        match outcome {
            Outcome::Fulfilled(value) => self.resolve(value),
            Outcome::Rejected(reason) => self.reject(reason),
        }
    }

    /// The task this resolver settles.
    pub fn task(&self) -> &Task<T> {
        &self.task
    }
}
