//! The demonstration scenarios.
//!
//! Each scenario builds tasks on a fresh event loop, drives it, and turns what
//! it observed into JSON so it can be compared against the documented result
//! and printed.

use crate::error::{CliError, CliResult};
use async_runtime::{
    all, all_settled, any, race, AbortController, AbortSignal, EventLoop, EventLoopConfig,
    Outcome, Task,
};
use core_types::Value;
use serde::Serialize;
use serde_json::json;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A named demonstration.
#[derive(Clone, Copy)]
pub struct Scenario {
    /// Name used on the command line
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    run: fn(&EventLoop) -> CliResult<serde_json::Value>,
    expected: fn() -> serde_json::Value,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// What running a scenario produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: &'static str,
    /// Whether the observed result matched the documented one
    pub passed: bool,
    /// The observed result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Why the scenario failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Loop time when the scenario finished, in milliseconds
    pub elapsed_ms: u64,
    /// Rejections dropped without a reaction
    pub unhandled_rejections: usize,
}

impl Scenario {
    /// Runs the scenario on a new event loop built from `config`.
    pub fn run(&self, config: EventLoopConfig) -> ScenarioReport {
        let span = tracing::info_span!("scenario", name = self.name);
        let _enter = span.enter();

        let event_loop = EventLoop::with_config(config);
        let outcome = (self.run)(&event_loop).and_then(|actual| {
            let expected = (self.expected)();
            if actual == expected {
                Ok(actual)
            } else {
                Err(CliError::Mismatch { expected, actual })
            }
        });
        let unhandled_rejections = event_loop.take_unhandled_rejections().len();

        match &outcome {
            Ok(_) => tracing::info!(elapsed_ms = event_loop.now(), "scenario passed"),
            Err(e) => tracing::error!(error = %e, "scenario failed"),
        }

        ScenarioReport {
            name: self.name,
            passed: outcome.is_ok(),
            error: outcome.as_ref().err().map(ToString::to_string),
            result: outcome.ok(),
            elapsed_ms: event_loop.now(),
            unhandled_rejections,
        }
    }

    /// The result this scenario demonstrates.
    pub fn expected(&self) -> serde_json::Value {
        (self.expected)()
    }
}

/// Every scenario, in presentation order.
pub const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "pending",
        description: "a task whose producer never settles it stays pending",
        run: pending_forever,
        expected: || json!({ "state": "pending", "finally_called": false }),
    },
    Scenario {
        name: "resolved",
        description: "a resolved task runs its fulfillment reaction",
        run: resolved,
        expected: || json!({ "resolved": true }),
    },
    Scenario {
        name: "rejected",
        description: "a rejected task runs its rejection reaction",
        run: rejected,
        expected: || json!({ "rejected": true }),
    },
    Scenario {
        name: "with-resolvers",
        description: "a task settled from outside its producer",
        run: with_resolvers,
        expected: || json!(1),
    },
    Scenario {
        name: "all",
        description: "all waits for every task to fulfill",
        run: all_fulfilled,
        expected: || json!([1, 2, 3]),
    },
    Scenario {
        name: "all-rejects",
        description: "all rejects as soon as one task rejects",
        run: all_rejects,
        expected: || json!({ "caught": 2 }),
    },
    Scenario {
        name: "all-settled",
        description: "all_settled reports every outcome in input order",
        run: all_settled_outcomes,
        expected: || {
            json!([
                { "status": "fulfilled", "value": 1 },
                { "status": "rejected", "reason": 2 },
                { "status": "fulfilled", "value": 3 },
            ])
        },
    },
    Scenario {
        name: "any",
        description: "any takes the first task to fulfill",
        run: any_first,
        expected: || json!(1),
    },
    Scenario {
        name: "race",
        description: "race takes the first task to settle, even a rejection",
        run: race_first,
        expected: || json!({ "caught": 1 }),
    },
    Scenario {
        name: "cancel",
        description: "an aborted request rejects while an unrelated one fulfills",
        run: cancel_first,
        expected: || {
            json!([
                { "status": "rejected", "reason": "aborted" },
                { "status": "fulfilled", "value": 1 },
            ])
        },
    },
    Scenario {
        name: "timeout",
        description: "a timeout signal abandons a slow task",
        run: timeout,
        expected: || json!({ "caught": "TimeoutError: The operation was aborted due to timeout" }),
    },
    Scenario {
        name: "stream",
        description: "a sequence of awaited values arrives in order",
        run: stream,
        expected: || json!([0, 1, 2]),
    },
];

/// Looks up a scenario by name.
pub fn find(name: &str) -> CliResult<&'static Scenario> {
    SCENARIOS
        .iter()
        .find(|scenario| scenario.name == name)
        .ok_or_else(|| CliError::UnknownScenario(name.to_string()))
}

/// Converts a task value to JSON.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Undefined | Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => json!(b),
        Value::Smi(n) => json!(n),
        Value::Double(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => json!(s),
        Value::Array(values) => values.iter().map(to_json).collect(),
        Value::Error(_) => json!(value.to_string()),
    }
}

fn outcome_to_json(outcome: &Outcome<Value>) -> serde_json::Value {
    match outcome {
        Outcome::Fulfilled(value) => json!({ "status": outcome.status(), "value": to_json(value) }),
        Outcome::Rejected(reason) => {
            json!({ "status": outcome.status(), "reason": to_json(reason) })
        }
    }
}

/// A task that settles with `outcome` after `delay_ms`.
fn after(event_loop: &EventLoop, delay_ms: u64, outcome: Outcome<Value>) -> Task<Value> {
    Task::new(event_loop, |resolver| {
        event_loop.set_timeout(delay_ms, move || resolver.settle_outcome(outcome));
        Ok(())
    })
}

fn pending_forever(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let finally_called = Rc::new(Cell::new(false));
    let called = finally_called.clone();
    let task: Task<Value> = Task::new(event_loop, |_| Ok(()));
    let _derived = task.finally(move || called.set(true));

    event_loop.run_until_done()?;
    Ok(json!({
        "state": task.state().name(),
        "finally_called": finally_called.get(),
    }))
}

fn resolved(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let flag = Rc::new(Cell::new(false));
    let set = flag.clone();
    let _derived = Task::resolved(event_loop, Value::Undefined).then(move |_| {
        set.set(true);
        Ok(())
    });

    event_loop.run_until_done()?;
    Ok(json!({ "resolved": flag.get() }))
}

fn rejected(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let flag = Rc::new(Cell::new(false));
    let set = flag.clone();
    let _derived = Task::<Value>::rejected(event_loop, Value::Undefined).catch(move |_| {
        set.set(true);
        Ok(Value::Undefined)
    });

    event_loop.run_until_done()?;
    Ok(json!({ "rejected": flag.get() }))
}

fn with_resolvers(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let (task, resolver) = Task::with_resolvers(event_loop);
    resolver.resolve(Value::Smi(1));
    Ok(to_json(&event_loop.block_on(&task)?))
}

fn numbers(event_loop: &EventLoop) -> Vec<Task<Value>> {
    vec![
        Task::resolved(event_loop, Value::Smi(1)),
        Task::rejected(event_loop, Value::Smi(2)),
        Task::resolved(event_loop, Value::Smi(3)),
    ]
}

fn all_fulfilled(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let tasks = (1..=3).map(|n| Task::resolved(event_loop, Value::Smi(n)));
    let values = event_loop.block_on(&all(event_loop, tasks))?;
    Ok(to_json(&Value::Array(values)))
}

fn all_rejects(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let caught = all(event_loop, numbers(event_loop))
        .then(|_| Ok(Value::from("unexpected fulfillment")))
        .catch(Ok);
    let reason = event_loop.block_on(&caught)?;
    Ok(json!({ "caught": to_json(&reason) }))
}

fn all_settled_outcomes(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let outcomes = event_loop.block_on(&all_settled(event_loop, numbers(event_loop)))?;
    Ok(outcomes.iter().map(outcome_to_json).collect())
}

fn any_first(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let tasks = [10, 20, 30]
        .into_iter()
        .zip(1..)
        .map(|(delay, n)| after(event_loop, delay, Outcome::Fulfilled(Value::Smi(n))));
    let value = event_loop.block_on(&any(event_loop, tasks))?;
    Ok(to_json(&value))
}

fn race_first(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let tasks = [10, 20, 30]
        .into_iter()
        .zip(1..)
        .map(|(delay, n)| after(event_loop, delay, Outcome::Rejected(Value::Smi(n))));
    let caught = race(event_loop, tasks).catch(Ok);
    let reason = event_loop.block_on(&caught)?;
    Ok(json!({ "caught": to_json(&reason) }))
}

/// A simulated request that rejects with `"aborted"` when its signal fires.
fn fetch(
    event_loop: &EventLoop,
    signal: Option<&AbortSignal>,
) -> (Task<Value>, async_runtime::Resolver<Value>) {
    let (task, resolver) = Task::with_resolvers(event_loop);
    if let Some(signal) = signal {
        let resolver = resolver.clone();
        signal.on_abort(move |_| resolver.reject("aborted"));
    }
    (task, resolver)
}

fn cancel_first(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let controller = AbortController::new(event_loop);
    let signal = controller.signal();
    let (first, _) = fetch(event_loop, Some(&signal));
    let (second, resolve_second) = fetch(event_loop, None);

    controller.abort(None);
    resolve_second.resolve(Value::Smi(1));

    let outcomes = event_loop.block_on(&all_settled(event_loop, [first, second]))?;
    Ok(outcomes.iter().map(outcome_to_json).collect())
}

fn timeout(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    let slow = after(event_loop, 500, Outcome::Fulfilled(Value::from("too late")));
    let bounded = AbortSignal::timeout(event_loop, 50).bind(&slow);
    let reason = event_loop.block_on(&bounded.catch(Ok))?;
    Ok(json!({ "caught": to_json(&reason) }))
}

fn stream(event_loop: &EventLoop) -> CliResult<serde_json::Value> {
    fn next(event_loop: &EventLoop, i: i32, mut values: Vec<Value>) -> Task<Value> {
        if i == 3 {
            return Task::resolved(event_loop, Value::Array(values));
        }
        let handle = event_loop.clone();
        Task::new(event_loop, |resolver| {
            resolver.resolve(Value::Smi(i));
            Ok(())
        })
        .and_then(move |value| {
            values.push(value);
            next(&handle, i + 1, values)
        })
    }

    let values = event_loop.block_on(&next(event_loop, 0, Vec::new()))?;
    Ok(to_json(&values))
}
