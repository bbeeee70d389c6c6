//! Aggregate combinators over collections of tasks.
//!
//! Each combinator subscribes to every input, even after its own outcome is
//! decided, so late rejections of sibling inputs count as handled.
//!
//! | Combinator      | Fulfills with               | Rejects with             | Empty input   |
//! |-----------------|-----------------------------|--------------------------|---------------|
//! | [`all`]         | every value, in input order | the first rejection      | fulfills `[]` |
//! | [`all_settled`] | every [`Outcome`], in order | never                    | fulfills `[]` |
//! | [`any`]         | the first fulfilled value   | `AggregateError` of all  | rejects       |
//! | [`race`]        | the first settlement        | the first settlement     | stays pending |
//!
//! "First" means first in settlement order, which is the order reactions are
//! delivered through the microtask queue. Inputs that are already settled when
//! the combinator is called are observed in input order.

use crate::event_loop::EventLoop;
use crate::task::{Outcome, Task};
use core_types::{JsError, Value};
use std::cell::RefCell;
use std::rc::Rc;

struct Collector<V> {
    slots: Vec<Option<V>>,
    remaining: usize,
}

impl<V> Collector<V> {
    fn new(len: usize) -> Self {
        Self {
            slots: std::iter::repeat_with(|| None).take(len).collect(),
            remaining: len,
        }
    }

    /// Fills `index`; returns every slot once the last one is filled.
    fn fill(&mut self, index: usize, value: V) -> Option<Vec<V>> {
        if self.slots[index].is_none() {
            self.remaining -= 1;
        }
        self.slots[index] = Some(value);
        if self.remaining == 0 {
            Some(self.slots.drain(..).flatten().collect())
        } else {
            None
        }
    }
}

/// Waits for every input to fulfill.
///
/// Fulfills with the values in input order. Rejects with the reason of the
/// first input to reject.
///
/// # Examples
///
/// ```
/// use async_runtime::{all, EventLoop, Task};
///
/// let event_loop = EventLoop::new();
/// let tasks = (1..=3).map(|n| Task::resolved(&event_loop, n));
/// let combined = all(&event_loop, tasks);
/// assert_eq!(event_loop.block_on(&combined).unwrap(), vec![1, 2, 3]);
/// ```
pub fn all<T, I>(event_loop: &EventLoop, tasks: I) -> Task<Vec<T>>
where
    T: Clone + 'static,
    I: IntoIterator<Item = Task<T>>,
{
    let tasks: Vec<Task<T>> = tasks.into_iter().collect();
    let (combined, resolver) = Task::with_resolvers(event_loop);
    if tasks.is_empty() {
        resolver.resolve(Vec::new());
        return combined;
    }

    tracing::trace!(task = %combined.id(), inputs = tasks.len(), "all");
    let collector = Rc::new(RefCell::new(Collector::new(tasks.len())));
    for (index, task) in tasks.iter().enumerate() {
        let (collector, resolver) = (collector.clone(), resolver.clone());
        task.subscribe(move |outcome| match outcome {
            Outcome::Fulfilled(value) => {
                let done = collector.borrow_mut().fill(index, value);
                if let Some(values) = done {
                    resolver.resolve(values);
                }
            }
            Outcome::Rejected(reason) => resolver.reject(reason),
        });
    }
    combined
}

/// Waits for every input to settle, and never rejects.
///
/// Fulfills with one [`Outcome`] per input, in input order.
pub fn all_settled<T, I>(event_loop: &EventLoop, tasks: I) -> Task<Vec<Outcome<T>>>
where
    T: Clone + 'static,
    I: IntoIterator<Item = Task<T>>,
{
    let tasks: Vec<Task<T>> = tasks.into_iter().collect();
    let (combined, resolver) = Task::with_resolvers(event_loop);
    if tasks.is_empty() {
        resolver.resolve(Vec::new());
        return combined;
    }

    tracing::trace!(task = %combined.id(), inputs = tasks.len(), "all_settled");
    let collector = Rc::new(RefCell::new(Collector::new(tasks.len())));
    for (index, task) in tasks.iter().enumerate() {
        let (collector, resolver) = (collector.clone(), resolver.clone());
        task.subscribe(move |outcome| {
            let done = collector.borrow_mut().fill(index, outcome);
            if let Some(outcomes) = done {
                resolver.resolve(outcomes);
            }
        });
    }
    combined
}

/// Waits for the first input to fulfill.
///
/// If every input rejects, rejects with an `AggregateError` carrying every
/// reason in input order. An empty input rejects immediately with an empty
/// `AggregateError`.
pub fn any<T, I>(event_loop: &EventLoop, tasks: I) -> Task<T>
where
    T: Clone + 'static,
    I: IntoIterator<Item = Task<T>>,
{
    let tasks: Vec<Task<T>> = tasks.into_iter().collect();
    let (combined, resolver) = Task::with_resolvers(event_loop);
    if tasks.is_empty() {
        resolver.reject(JsError::aggregate(Vec::new()));
        return combined;
    }

    tracing::trace!(task = %combined.id(), inputs = tasks.len(), "any");
    let collector: Rc<RefCell<Collector<Value>>> =
        Rc::new(RefCell::new(Collector::new(tasks.len())));
    for (index, task) in tasks.iter().enumerate() {
        let (collector, resolver) = (collector.clone(), resolver.clone());
        task.subscribe(move |outcome| match outcome {
            Outcome::Fulfilled(value) => resolver.resolve(value),
            Outcome::Rejected(reason) => {
                let done = collector.borrow_mut().fill(index, reason);
                if let Some(reasons) = done {
                    resolver.reject(JsError::aggregate(reasons));
                }
            }
        });
    }
    combined
}

/// Settles like the first input to settle, whichever way it settles.
///
/// An empty input never settles.
pub fn race<T, I>(event_loop: &EventLoop, tasks: I) -> Task<T>
where
    T: Clone + 'static,
    I: IntoIterator<Item = Task<T>>,
{
    let (combined, resolver) = Task::with_resolvers(event_loop);
    for task in tasks {
        let resolver = resolver.clone();
        task.subscribe(move |outcome| resolver.settle_outcome(outcome));
    }
    combined
}
