use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use quanta::Clock;
use quanta::Instant;

/// `last` value meaning the gate has never fired.
const NEVER: u64 = u64::MAX;

/// Forwards at most one call per `interval` to the wrapped callable.
///
/// The first call is immediately eligible; after that a call forwards only
/// when at least `interval` has elapsed since the last forwarded call, on a
/// monotonic clock. Suppressed calls change no state and return `None`.
///
/// Eligibility and the timestamp update are a single CAS on the last-fired
/// timestamp, so two callers racing on the same window cannot both forward:
/// whoever wins the exchange owns the window. The clock is monotonic
/// ([`quanta`]), so wall-clock adjustments cannot widen or shrink a window.
pub struct RateGate<F> {
    last: AtomicU64,
    interval_ns: u64,
    clock: Clock,
    anchor: Instant,
    target: F,
}

impl<F> RateGate<F> {
    /// Wraps `target` so that at most one call per `interval` forwards.
    ///
    /// An `interval` of zero admits every call.
    pub fn new(target: F, interval: Duration) -> Self {
        Self::with_clock(target, interval, Clock::new())
    }

    fn with_clock(target: F, interval: Duration, clock: Clock) -> Self {
        let anchor = clock.now();
        Self {
            last: AtomicU64::new(NEVER),
            interval_ns: interval.as_nanos() as u64,
            clock,
            anchor,
            target,
        }
    }

    /// Invokes the gate with one input. Returns `Some(result)` when the call
    /// was forwarded, `None` when it fell inside the throttle window.
    pub fn call<T, R>(&self, input: T) -> Option<R>
    where
        F: Fn(T) -> R,
    {
        self.claim().then(|| (self.target)(input))
    }

    /// Nullary variant of [`call`](Self::call).
    pub fn fire<R>(&self) -> Option<R>
    where
        F: Fn() -> R,
    {
        self.claim().then(|| (self.target)())
    }

    fn claim(&self) -> bool {
        let now = self.clock.now().duration_since(self.anchor).as_nanos() as u64;
        // saturating_sub covers a caller whose `now` read is staler than a
        // timestamp another thread just wrote.
        self.last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                if last == NEVER || now.saturating_sub(last) >= self.interval_ns {
                    Some(now)
                } else {
                    None
                }
            })
            .is_ok()
    }
}

impl<F> fmt::Debug for RateGate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateGate")
            .field("last", &self.last)
            .field("interval_ns", &self.interval_ns)
            .finish_non_exhaustive()
    }
}
