use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Runs the wrapped callable at most once and hands every caller the cached
/// result of that single run.
///
/// The first caller to win a CAS on the `fired` flag executes the target;
/// everyone else waits for the winner to publish and then reads the cached
/// value. Publication goes through a [`OnceLock`], which gives readers a
/// happens-before edge on the winner's write, not just an atomic flag.
///
/// The shot is consumed *before* the target runs: if the target panics, the
/// panic unwinds to the winning caller alone, the target is never retried,
/// and later callers observe `None`.
///
/// ```rust
/// use call_gates::SingleShot;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let pulls = AtomicUsize::new(0);
/// let shot = SingleShot::new(|| pulls.fetch_add(1, Ordering::SeqCst) + 1);
///
/// assert_eq!(shot.fire(), Some(1));
/// assert_eq!(shot.fire(), Some(1)); // cached, the supplier does not re-run
/// assert_eq!(pulls.load(Ordering::SeqCst), 1);
/// ```
pub struct SingleShot<F, R> {
    fired: AtomicBool,
    result: OnceLock<Option<R>>,
    target: F,
}

impl<F, R: Clone> SingleShot<F, R> {
    /// Wraps `target` so that it executes on the first invocation only.
    pub fn new(target: F) -> Self {
        Self {
            fired: AtomicBool::new(false),
            result: OnceLock::new(),
            target,
        }
    }

    /// Invokes the shot with one input. The input is only consumed by the
    /// winning call; later inputs are dropped and the cached result returned.
    pub fn call<T>(&self, input: T) -> Option<R>
    where
        F: Fn(T) -> R,
    {
        self.run_once(|| (self.target)(input))
    }

    /// Nullary variant of [`call`](Self::call).
    pub fn fire(&self) -> Option<R>
    where
        F: Fn() -> R,
    {
        self.run_once(|| (self.target)())
    }

    fn run_once(&self, exec: impl FnOnce() -> R) -> Option<R> {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            // The guard publishes an empty result if exec unwinds, so
            // waiters are released instead of parking forever.
            let guard = PublishGuard { slot: &self.result };
            let value = exec();
            guard.publish(value);
        }
        self.result.wait().clone()
    }
}

impl<F, R> fmt::Debug for SingleShot<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleShot")
            .field("fired", &self.fired)
            .finish_non_exhaustive()
    }
}

struct PublishGuard<'a, R> {
    slot: &'a OnceLock<Option<R>>,
}

impl<R> PublishGuard<'_, R> {
    fn publish(self, value: R) {
        let _ = self.slot.set(Some(value));
        std::mem::forget(self);
    }
}

impl<R> Drop for PublishGuard<'_, R> {
    fn drop(&mut self) {
        let _ = self.slot.set(None);
    }
}
