//! # call-gates
//!
//! `call-gates` provides lock-free call-modulating function wrappers.
//!
//! Each wrapper captures a callable at construction time and produces a value
//! with the same call shape plus altered invocation semantics: fire only after
//! N calls ([`CallGate`]), fire at most once and cache the result
//! ([`SingleShot`]), or fire at most once per time interval ([`RateGate`]).
//!
//! ## Core Philosophy
//!
//! The only interesting part of a call modulator is the shared mutable state
//! it updates under concurrent invocation: a counter, a write-once result
//! slot, or a last-fired timestamp. A `Mutex` around that state creates a
//! bottleneck under thread contention, so every state transition here is a
//! single atomic Compare-And-Swap: exactly one caller crosses a gate's
//! threshold, exactly one caller wins a `SingleShot`, and at most one caller
//! claims any throttle window.
//!
//! ## Key Concepts
//!
//! * **Lock-Free**: No `Mutex` or `RwLock` in the hot path.
//! * **Shared by reference**: every method takes `&self`; wrap an instance in
//!   an `Arc` and invoke it from as many threads as you like.
//! * **Drop, don't queue**: a suppressed call is permanently dropped and
//!   reported as `None`. Nothing is buffered or replayed.
//! * **Monotonic time**: [`RateGate`] measures its interval on a monotonic
//!   clock, so wall-clock adjustments cannot corrupt the throttle window.
//!
//! ## Example
//!
//! ```rust
//! use call_gates::CallGate;
//!
//! let gate = CallGate::new(2, |msg: &str| msg.len()).unwrap();
//!
//! assert_eq!(gate.call("hello"), None); // suppressed
//! assert_eq!(gate.call("hey"), None); // suppressed
//! assert_eq!(gate.call("third time"), Some(10)); // forwarded
//! ```

mod call_gate;
mod rate_gate;
mod single_shot;

pub use call_gate::CallGate;
pub use rate_gate::RateGate;
pub use single_shot::SingleShot;

/// Errors produced when constructing a wrapper.
///
/// Validation happens at wrap time only; once a wrapper exists, its calls
/// cannot fail on their own. Errors raised by the wrapped callable itself
/// propagate to the caller untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A [`CallGate`] was asked to open after zero calls, which would make it
    /// a plain pass-through.
    #[error("count must be greater than zero")]
    ZeroCount,
}
