//! Contract tests for async_runtime component
//!
//! These tests pin down the observable behaviour other crates rely on:
//! settlement rules, reaction ordering, combinator results and cancellation.
