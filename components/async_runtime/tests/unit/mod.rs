//! Unit tests for async_runtime
//!
//! These tests exercise each public type through the crate's public API.

mod abort_test;
mod combinator_test;
mod diagnostics_test;
