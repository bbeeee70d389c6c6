//! Deferred tasks, combinators and cancellation on a cooperative event loop.
//!
//! This crate provides:
//! - Single-assignment tasks that settle exactly once
//! - The `all`, `all_settled`, `any` and `race` combinators
//! - Cooperative cancellation through abort signals
//! - A single-threaded event loop with microtasks, macrotasks and timers
//!
//! # Overview
//!
//! - [`EventLoop`] - Run loop that delivers every task reaction
//! - [`Task`] / [`Resolver`] - A deferred value and its settlement capability
//! - [`all`], [`all_settled`], [`any`], [`race`] - Aggregate combinators
//! - [`AbortController`] / [`AbortSignal`] - Cooperative cancellation
//!
//! Rejected tasks that are dropped without any reaction are reported as
//! [`UnhandledRejection`]s.
//!
//! # Examples
//!
//! ## Awaiting a timer
//!
//! ```
//! use async_runtime::{EventLoop, Task};
//!
//! let event_loop = EventLoop::new();
//! let (task, resolver) = Task::with_resolvers(&event_loop);
//! event_loop.set_timeout(100, move || resolver.resolve("done"));
//!
//! assert_eq!(event_loop.block_on(&task).unwrap(), "done");
//! assert_eq!(event_loop.now(), 100);
//! ```
//!
//! ## Cancelling with a signal
//!
//! ```
//! use async_runtime::{all_settled, AbortController, EventLoop, Task};
//!
//! let event_loop = EventLoop::new();
//! let controller = AbortController::new(&event_loop);
//!
//! let (slow, resolve_slow) = Task::with_resolvers(&event_loop);
//! event_loop.set_timeout(500, move || resolve_slow.resolve(1));
//! let (fast, resolve_fast) = Task::with_resolvers(&event_loop);
//! event_loop.set_timeout(10, move || resolve_fast.resolve(2));
//!
//! let bound = controller.signal().bind(&slow);
//! controller.abort(None);
//!
//! let outcomes = event_loop
//!     .block_on(&all_settled(&event_loop, [bound, fast]))
//!     .unwrap();
//! let statuses: Vec<_> = outcomes.iter().map(|o| o.status()).collect();
//! assert_eq!(statuses, ["rejected", "fulfilled"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abort;
pub mod combinators;
pub mod config;
mod diagnostics;
pub mod error;
pub mod event_loop;
pub mod task;
pub mod task_queue;

// Re-export main types at crate root
pub use abort::{AbortController, AbortSignal};
pub use combinators::{all, all_settled, any, race};
pub use config::{ClockMode, EventLoopConfig};
pub use diagnostics::UnhandledRejection;
pub use error::AwaitError;
pub use event_loop::EventLoop;
pub use task::{Outcome, Reaction, Resolution, Resolver, Task, TaskId, TaskState};
pub use task_queue::{Macrotask, MicroTask, MicrotaskQueue, TaskQueue, TimerId, TimerQueue};
