use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use super::Error;

/// Suppresses the first `count` invocations, then forwards every call after
/// that to the wrapped callable.
///
/// Suppressed calls do nothing except decrement the internal counter and
/// return `None`; once the counter reaches zero it stays there and every
/// subsequent call forwards. The threshold-crossing decision is made with a
/// single atomic test-and-decrement, so under concurrent invocation exactly
/// one caller observes each pre-threshold slot.
pub struct CallGate<F> {
    remaining: AtomicUsize,
    target: F,
}

impl<F> CallGate<F> {
    /// Creates a gate that opens after `count` suppressed calls.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroCount`] if `count` is zero.
    pub fn new(count: usize, target: F) -> Result<Self, Error> {
        if count == 0 {
            return Err(Error::ZeroCount);
        }
        Ok(Self {
            remaining: AtomicUsize::new(count),
            target,
        })
    }

    /// Invokes the gate with one input. Returns `Some(result)` once the gate
    /// is open, `None` while it is still counting down.
    pub fn call<T, R>(&self, input: T) -> Option<R>
    where
        F: Fn(T) -> R,
    {
        self.admit().then(|| (self.target)(input))
    }

    /// Nullary variant of [`call`](Self::call).
    pub fn fire<R>(&self) -> Option<R>
    where
        F: Fn() -> R,
    {
        self.admit().then(|| (self.target)())
    }

    fn admit(&self) -> bool {
        // Err means the counter was already at zero: the gate is open.
        // Each Ok consumes exactly one pre-threshold slot, even when many
        // callers race on a fresh gate.
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |val| {
                if val > 0 { Some(val - 1) } else { None }
            })
            .is_err()
    }
}

impl<F> fmt::Debug for CallGate<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallGate")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::thread;

    use super::*;

    #[test]
    fn it_suppresses_then_forwards() {
        let hits = AtomicUsize::new(0);
        let gate = CallGate::new(2, |msg: &str| {
            hits.fetch_add(1, Ordering::SeqCst);
            msg.to_owned()
        })
        .unwrap();

        assert_eq!(gate.call("a"), None);
        assert_eq!(gate.call("b"), None);
        assert_eq!(gate.call("c"), Some("c".to_owned()));
        assert_eq!(gate.call("d"), Some("d".to_owned()));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn it_counts_nullary_calls() {
        let hits = AtomicUsize::new(0);
        let gate = CallGate::new(1, || hits.fetch_add(1, Ordering::SeqCst)).unwrap();

        assert_eq!(gate.fire(), None);
        assert_eq!(gate.fire(), Some(0));
        assert_eq!(gate.fire(), Some(1));
    }

    #[test]
    fn it_rejects_zero_count() {
        assert_eq!(CallGate::new(0, || ()).err(), Some(Error::ZeroCount));
    }

    //
    // m one-shot callers against count = k must produce exactly m - k
    // forwards: no double-forward, no lost forward.
    //
    #[test]
    fn it_opens_for_exactly_the_overflow() {
        let threads = 64;
        let count = 40;
        let forwards = Arc::new(AtomicUsize::new(0));
        let gate = {
            let forwards = Arc::clone(&forwards);
            Arc::new(
                CallGate::new(count, move |_: usize| {
                    forwards.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap(),
            )
        };

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.call(i))
            })
            .collect();
        let forwarded = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(Option::is_some)
            .count();

        assert_eq!(forwarded, threads - count);
        assert_eq!(forwards.load(Ordering::SeqCst), threads - count);
    }

    #[tokio::test]
    async fn it_opens_under_task_bursts() {
        let count = 100;
        let forwards = Arc::new(AtomicUsize::new(0));
        let gate = {
            let forwards = Arc::clone(&forwards);
            Arc::new(
                CallGate::new(count, move || {
                    forwards.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap(),
            )
        };

        let mut handles = vec![];
        for _ in 0..count + 10 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move { gate.fire() }));
        }

        let results = futures::future::join_all(handles).await;
        let forwarded = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Some(()))))
            .count();

        assert_eq!(forwarded, 10);
        assert_eq!(forwards.load(Ordering::SeqCst), 10);
    }
}
