//! Unit tests for AbortController and AbortSignal

use async_runtime::{all_settled, AbortController, AbortSignal, EventLoop, Outcome, Task};
use core_types::{ErrorKind, JsError, Value};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn listeners_fire_in_registration_order() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);
    let signal = controller.signal();
    let log = Rc::new(RefCell::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let l = log.clone();
        signal.on_abort(move |_| l.borrow_mut().push(name));
    }

    assert!(controller.abort(None));
    assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn abort_is_idempotent_and_keeps_first_reason() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);
    let signal = controller.signal();

    assert!(controller.abort(Some(Value::from("first"))));
    assert!(!controller.abort(Some(Value::from("second"))));
    assert!(signal.aborted());
    assert_eq!(signal.reason(), Some(Value::from("first")));
    assert_eq!(signal.throw_if_aborted(), Err(Value::from("first")));
}

#[test]
fn listener_receives_reason() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);
    let seen = Rc::new(RefCell::new(None));
    let s = seen.clone();
    controller
        .signal()
        .on_abort(move |reason| *s.borrow_mut() = Some(reason.clone()));

    controller.abort(None);
    assert_eq!(*seen.borrow(), Some(Value::from(JsError::abort())));
}

#[test]
fn listener_added_during_abort_runs_later() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);
    let signal = controller.signal();
    let log = Rc::new(RefCell::new(Vec::new()));

    let (l, inner_signal) = (log.clone(), signal.clone());
    signal.on_abort(move |_| {
        l.borrow_mut().push("outer");
        let l = l.clone();
        inner_signal.on_abort(move |_| l.borrow_mut().push("inner"));
    });

    controller.abort(None);
    assert_eq!(*log.borrow(), vec!["outer"]);
    event_loop.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec!["outer", "inner"]);
}

#[test]
fn bound_task_rejects_with_abort_reason() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);
    let (work, resolver) = Task::with_resolvers(&event_loop);
    let bound = controller.signal().bind(&work);

    controller.abort(Some(Value::from("aborted")));
    resolver.resolve(1);

    let err = event_loop.block_on(&bound).unwrap_err();
    assert_eq!(err.reason(), Some(&Value::from("aborted")));
    assert_eq!(event_loop.block_on(&work).unwrap(), 1);
}

#[test]
fn bound_task_mirrors_outcome_without_abort() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);
    let (work, resolver) = Task::with_resolvers(&event_loop);
    let bound = controller.signal().bind(&work);

    event_loop.set_timeout(10, move || resolver.resolve("done"));
    assert_eq!(event_loop.block_on(&bound).unwrap(), "done");

    controller.abort(None);
    assert_eq!(bound.state(), async_runtime::TaskState::Fulfilled("done"));
}

#[test]
fn binding_to_aborted_signal_rejects_immediately() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);
    controller.abort(None);

    let (work, _resolver) = Task::<i32>::with_resolvers(&event_loop);
    let bound = controller.signal().bind(&work);
    assert!(bound.is_settled());

    let reason = event_loop.block_on(&bound).unwrap_err().into_reason().unwrap();
    assert_eq!(reason.as_error().map(|e| e.kind), Some(ErrorKind::AbortError));
}

#[test]
fn cancel_first_request_scenario() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);

    let (first, _first_resolver) = Task::with_resolvers(&event_loop);
    let first = controller.signal().bind(&first);
    let (second, second_resolver) = Task::with_resolvers(&event_loop);

    controller.abort(Some(Value::from("aborted")));
    second_resolver.resolve(1);

    let settled = all_settled(&event_loop, [first, second]);
    assert_eq!(
        event_loop.block_on(&settled).unwrap(),
        vec![
            Outcome::Rejected(Value::from("aborted")),
            Outcome::Fulfilled(1),
        ]
    );
    assert!(event_loop.unhandled_rejections().is_empty());
}

#[test]
fn timeout_signal_aborts_with_timeout_error() {
    let event_loop = EventLoop::new();
    let signal = AbortSignal::timeout(&event_loop, 40);
    let (work, _resolver) = Task::<()>::with_resolvers(&event_loop);
    let bound = signal.bind(&work);

    let reason = event_loop.block_on(&bound).unwrap_err().into_reason().unwrap();
    assert_eq!(reason, Value::from(JsError::timeout()));
    assert_eq!(event_loop.now(), 40);
    assert!(signal.aborted());
}

#[test]
fn bind_removes_its_listener_once_the_source_settles() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);
    let signal = controller.signal();

    for n in 0..1000 {
        let bound = signal.bind(&Task::resolved(&event_loop, n));
        assert_eq!(event_loop.block_on(&bound).unwrap(), n);
    }
    assert_eq!(signal.listener_count(), 0);

    let (pending, _resolver) = Task::<i32>::with_resolvers(&event_loop);
    let _waiting = signal.bind(&pending);
    assert_eq!(signal.listener_count(), 1);
}

#[test]
fn unobserved_bound_rejection_is_reported_while_signal_lives() {
    let event_loop = EventLoop::new();
    let controller = AbortController::new(&event_loop);
    let source: Task<i32> = Task::rejected(&event_loop, "source failed");

    drop(controller.signal().bind(&source));
    event_loop.run_until_done().unwrap();

    assert!(!controller.signal().aborted());
    let reports = event_loop.unhandled_rejections();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].reason, Value::from("source failed"));
}
