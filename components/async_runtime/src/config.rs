//! Event loop configuration.

/// How the event loop measures time for timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// Time only moves when the loop is idle and jumps straight to the next
    /// timer deadline. Deterministic, and what tests use.
    #[default]
    Virtual,
    /// Time follows the wall clock; the loop sleeps until the next deadline.
    Wall,
}

/// Configuration for an [`EventLoop`](crate::EventLoop).
///
/// # Examples
///
/// ```
/// use async_runtime::{ClockMode, EventLoop, EventLoopConfig};
///
/// let config = EventLoopConfig::default()
///     .with_clock(ClockMode::Wall)
///     .with_max_microtasks_per_turn(1_000);
/// let event_loop = EventLoop::with_config(config);
/// assert_eq!(event_loop.config().clock, ClockMode::Wall);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLoopConfig {
    /// Clock used for timers
    pub clock: ClockMode,
    /// Upper bound on microtasks drained in a single drain; exceeding it
    /// fails the turn instead of spinning forever
    pub max_microtasks_per_turn: usize,
}

impl EventLoopConfig {
    /// Default microtask limit per drain.
    pub const DEFAULT_MAX_MICROTASKS: usize = 100_000;

    /// Sets the clock mode.
    pub fn with_clock(mut self, clock: ClockMode) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the microtask limit per drain.
    pub fn with_max_microtasks_per_turn(mut self, limit: usize) -> Self {
        self.max_microtasks_per_turn = limit;
        self
    }
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            clock: ClockMode::Virtual,
            max_microtasks_per_turn: Self::DEFAULT_MAX_MICROTASKS,
        }
    }
}
