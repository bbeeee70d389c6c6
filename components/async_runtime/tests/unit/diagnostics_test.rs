//! Unit tests for unhandled rejection reporting

use async_runtime::{all, any, race, EventLoop, Task, UnhandledRejection};
use core_types::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn dropped_rejection_is_reported() {
    let event_loop = EventLoop::new();
    let task: Task<i32> = Task::rejected(&event_loop, "lost");
    let id = task.id();
    drop(task);

    let reports = event_loop.unhandled_rejections();
    assert_eq!(
        reports,
        vec![UnhandledRejection {
            task: id,
            reason: Value::from("lost"),
        }]
    );
}

#[test]
fn handled_rejection_is_not_reported() {
    let event_loop = EventLoop::new();
    let task: Task<i32> = Task::rejected(&event_loop, "seen");
    let recovered = task.catch(|_| Ok(0));
    drop(task);

    event_loop.block_on(&recovered).unwrap();
    assert!(event_loop.unhandled_rejections().is_empty());
}

#[test]
fn fulfilled_and_pending_tasks_are_not_reported() {
    let event_loop = EventLoop::new();
    drop(Task::resolved(&event_loop, 1));
    drop(Task::<i32>::with_resolvers(&event_loop));
    assert!(event_loop.unhandled_rejections().is_empty());
}

#[test]
fn rejection_propagated_to_unobserved_derived_task_is_reported() {
    let event_loop = EventLoop::new();
    let task: Task<i32> = Task::rejected(&event_loop, "propagated");
    let derived = task.then(|n| Ok(n + 1));
    event_loop.run_until_done().unwrap();
    drop(task);
    assert!(event_loop.unhandled_rejections().is_empty());

    drop(derived);
    let reports = event_loop.take_unhandled_rejections();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].reason, Value::from("propagated"));
    assert!(event_loop.unhandled_rejections().is_empty());
}

#[test]
fn sink_receives_reports() {
    let event_loop = EventLoop::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    event_loop.set_rejection_sink(move |rejection| s.borrow_mut().push(rejection.to_string()));

    let task: Task<()> = Task::rejected(&event_loop, "boom");
    let id = task.id();
    drop(task);

    assert_eq!(
        *seen.borrow(),
        vec![format!("unhandled rejection in {}: boom", id)]
    );
}

#[test]
fn combinators_handle_late_sibling_rejections() {
    let event_loop = EventLoop::new();
    {
        let first = all(
            &event_loop,
            vec![
                Task::<i32>::rejected(&event_loop, "a"),
                Task::rejected(&event_loop, "b"),
            ],
        );
        let second = race(
            &event_loop,
            vec![Task::resolved(&event_loop, 1), Task::rejected(&event_loop, "c")],
        );
        let third = any(
            &event_loop,
            vec![Task::resolved(&event_loop, 1), Task::rejected(&event_loop, "d")],
        );

        assert!(event_loop.block_on(&first).is_err());
        assert_eq!(event_loop.block_on(&second).unwrap(), 1);
        assert_eq!(event_loop.block_on(&third).unwrap(), 1);
        event_loop.run_until_done().unwrap();
    }
    assert!(event_loop.unhandled_rejections().is_empty());
}

#[test]
fn reports_do_not_interrupt_the_loop() {
    let event_loop = EventLoop::new();
    let handle = event_loop.clone();
    event_loop.queue_microtask(move || {
        drop(Task::<i32>::rejected(&handle, "inside"));
    });
    let after = Task::resolved(&event_loop, "still running");
    assert_eq!(event_loop.block_on(&after).unwrap(), "still running");
    assert_eq!(event_loop.unhandled_rejections().len(), 1);
}

#[test]
fn sink_can_schedule_timers_when_a_cleared_timer_drops_a_rejection() {
    let event_loop = EventLoop::new();
    let handle = event_loop.clone();
    event_loop.set_rejection_sink(move |_| {
        handle.set_timeout(1, || {});
    });

    let task: Task<i32> = Task::rejected(&event_loop, "held by timer");
    let id = event_loop.set_timeout(10, move || drop(task));

    assert!(event_loop.clear_timeout(id));
    assert_eq!(event_loop.unhandled_rejections().len(), 1);
    assert_eq!(event_loop.pending_timers(), 1);
}
