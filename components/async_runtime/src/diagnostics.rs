//! Unhandled rejection reporting.
//!
//! A task that is rejected and dropped without anyone ever registering a
//! reaction on it is reported here. Reports are advisory: they are logged,
//! forwarded to an optional sink and kept for inspection, but they never
//! interrupt the event loop.

use crate::task::TaskId;
use core_types::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A rejection that no reaction ever observed.
#[derive(Debug, Clone, PartialEq)]
pub struct UnhandledRejection {
    /// The task that was rejected
    pub task: TaskId,
    /// Its rejection reason
    pub reason: Value,
}

impl fmt::Display for UnhandledRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unhandled rejection in {}: {}", self.task, self.reason)
    }
}

type Sink = Rc<dyn Fn(&UnhandledRejection)>;

#[derive(Default)]
struct DiagnosticsInner {
    reports: RefCell<Vec<UnhandledRejection>>,
    sink: RefCell<Option<Sink>>,
}

/// Shared, process-side collector of unhandled rejections.
///
/// Held separately from the loop queues so that reporting from a `Drop`
/// never contends with a queue borrow.
#[derive(Clone, Default)]
pub(crate) struct Diagnostics {
    inner: Rc<DiagnosticsInner>,
}

impl Diagnostics {
    pub(crate) fn report(&self, rejection: UnhandledRejection) {
        tracing::warn!(
            task = %rejection.task,
            reason = %rejection.reason,
            "unhandled task rejection"
        );

        let sink = self.inner.sink.borrow().clone();
        if let Some(sink) = sink {
            sink(&rejection);
        }
        self.inner.reports.borrow_mut().push(rejection);
    }

    pub(crate) fn set_sink(&self, sink: Sink) {
        *self.inner.sink.borrow_mut() = Some(sink);
    }

    pub(crate) fn reports(&self) -> Vec<UnhandledRejection> {
        self.inner.reports.borrow().clone()
    }

    pub(crate) fn take_reports(&self) -> Vec<UnhandledRejection> {
        std::mem::take(&mut *self.inner.reports.borrow_mut())
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("reports", &self.inner.reports.borrow().len())
            .finish()
    }
}
