//! Unit tests for all, all_settled, any and race

use async_runtime::{all, all_settled, any, race, EventLoop, Outcome, Task};
use core_types::{ErrorKind, JsError, Value};

fn delayed<T: Clone + 'static>(
    event_loop: &EventLoop,
    delay_ms: u64,
    outcome: Outcome<T>,
) -> Task<T> {
    let (task, resolver) = Task::with_resolvers(event_loop);
    event_loop.set_timeout(delay_ms, move || resolver.settle_outcome(outcome));
    task
}

fn aggregate_reasons(reason: Value) -> Vec<Value> {
    match reason {
        Value::Error(JsError {
            kind: ErrorKind::AggregateError,
            errors,
            ..
        }) => errors,
        other => panic!("expected AggregateError, got {:?}", other),
    }
}

#[test]
fn all_of_resolved_keeps_input_order() {
    let event_loop = EventLoop::new();
    let tasks = vec![
        delayed(&event_loop, 30, Outcome::Fulfilled(1)),
        delayed(&event_loop, 10, Outcome::Fulfilled(2)),
        Task::resolved(&event_loop, 3),
    ];
    let combined = all(&event_loop, tasks);
    assert_eq!(event_loop.block_on(&combined).unwrap(), vec![1, 2, 3]);
}

#[test]
fn all_rejects_with_middle_rejection() {
    let event_loop = EventLoop::new();
    let tasks = vec![
        Task::resolved(&event_loop, 1),
        Task::rejected(&event_loop, Value::Smi(2)),
        Task::resolved(&event_loop, 3),
    ];
    let combined = all(&event_loop, tasks);
    let err = event_loop.block_on(&combined).unwrap_err();
    assert_eq!(err.reason(), Some(&Value::Smi(2)));
}

#[test]
fn all_rejects_with_first_rejection_by_time() {
    let event_loop = EventLoop::new();
    let tasks = vec![
        delayed::<i32>(&event_loop, 20, Outcome::Rejected("slow".into())),
        delayed::<i32>(&event_loop, 5, Outcome::Rejected("fast".into())),
    ];
    let combined = all(&event_loop, tasks);
    let err = event_loop.block_on(&combined).unwrap_err();
    assert_eq!(err.reason(), Some(&Value::from("fast")));
}

#[test]
fn all_settled_reports_every_outcome_in_input_order() {
    let event_loop = EventLoop::new();
    let tasks = vec![
        delayed(&event_loop, 20, Outcome::Fulfilled("a")),
        delayed(&event_loop, 10, Outcome::Rejected("b".into())),
        Task::resolved(&event_loop, "c"),
    ];
    let combined = all_settled(&event_loop, tasks);
    let outcomes = event_loop.block_on(&combined).unwrap();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Fulfilled("a"),
            Outcome::Rejected(Value::from("b")),
            Outcome::Fulfilled("c"),
        ]
    );
}

#[test]
fn all_settled_empty_fulfills_with_nothing() {
    let event_loop = EventLoop::new();
    let combined = all_settled(&event_loop, Vec::<Task<i32>>::new());
    assert!(event_loop.block_on(&combined).unwrap().is_empty());
}

#[test]
fn any_takes_first_fulfillment() {
    let event_loop = EventLoop::new();
    let tasks = vec![
        delayed(&event_loop, 30, Outcome::Fulfilled(30)),
        delayed(&event_loop, 10, Outcome::Fulfilled(10)),
        delayed(&event_loop, 20, Outcome::Fulfilled(20)),
    ];
    let combined = any(&event_loop, tasks);
    assert_eq!(event_loop.block_on(&combined).unwrap(), 10);
}

#[test]
fn any_skips_rejections() {
    let event_loop = EventLoop::new();
    let tasks = vec![
        Task::rejected(&event_loop, "no"),
        delayed(&event_loop, 10, Outcome::Fulfilled(7)),
    ];
    let combined = any(&event_loop, tasks);
    assert_eq!(event_loop.block_on(&combined).unwrap(), 7);
}

#[test]
fn any_all_rejected_aggregates_in_input_order() {
    let event_loop = EventLoop::new();
    let tasks = vec![
        delayed::<i32>(&event_loop, 20, Outcome::Rejected(Value::Smi(1))),
        delayed::<i32>(&event_loop, 10, Outcome::Rejected(Value::Smi(2))),
    ];
    let combined = any(&event_loop, tasks);
    let reason = event_loop.block_on(&combined).unwrap_err().into_reason().unwrap();
    assert_eq!(aggregate_reasons(reason), vec![Value::Smi(1), Value::Smi(2)]);
}

#[test]
fn any_empty_rejects_with_empty_aggregate() {
    let event_loop = EventLoop::new();
    let combined = any(&event_loop, Vec::<Task<i32>>::new());
    let reason = event_loop.block_on(&combined).unwrap_err().into_reason().unwrap();
    assert!(aggregate_reasons(reason).is_empty());
}

#[test]
fn race_takes_first_rejection() {
    let event_loop = EventLoop::new();
    let tasks = [10, 20, 30].map(|delay| {
        delayed::<i32>(
            &event_loop,
            delay,
            Outcome::Rejected(Value::from(format!("failed after {}", delay))),
        )
    });
    let combined = race(&event_loop, tasks);
    let err = event_loop.block_on(&combined).unwrap_err();
    assert_eq!(err.reason(), Some(&Value::from("failed after 10")));
}

#[test]
fn race_takes_first_fulfillment() {
    let event_loop = EventLoop::new();
    let tasks = vec![
        delayed(&event_loop, 15, Outcome::Rejected("late".into())),
        delayed(&event_loop, 5, Outcome::Fulfilled("early")),
    ];
    let combined = race(&event_loop, tasks);
    assert_eq!(event_loop.block_on(&combined).unwrap(), "early");
}

#[test]
fn race_of_settled_inputs_prefers_input_order() {
    let event_loop = EventLoop::new();
    let tasks = vec![
        Task::rejected(&event_loop, "first"),
        Task::resolved(&event_loop, 2),
    ];
    let combined = race(&event_loop, tasks);
    let err = event_loop.block_on(&combined).unwrap_err();
    assert_eq!(err.reason(), Some(&Value::from("first")));
}

#[test]
fn race_empty_never_settles() {
    let event_loop = EventLoop::new();
    let combined = race(&event_loop, Vec::<Task<i32>>::new());
    event_loop.run_until_done().unwrap();
    assert!(combined.is_pending());
    assert!(event_loop.block_on(&combined).is_err());
}

#[test]
fn combinators_accept_any_iterator() {
    let event_loop = EventLoop::new();
    let combined = all(&event_loop, (0..4).map(|n| Task::resolved(&event_loop, n * n)));
    assert_eq!(event_loop.block_on(&combined).unwrap(), vec![0, 1, 4, 9]);
}
