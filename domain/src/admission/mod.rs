//! Admission control domain
//!
//! Pure bookkeeping used by the admission controller's dispatch loop:
//!
//! - [`Priority`] — queue ordering class of a submitted operation
//! - [`RateWindow`] — trailing 60-second request and token accounting
//! - [`CircuitState`] — consecutive-failure circuit breaker
//! - [`RetryPolicy`] — exponential backoff with jitter
//! - [`AdmissionPolicy`] — the limits a controller enforces
//!
//! Nothing here reads the clock; every method takes `now` explicitly so the
//! loop can drive it from a (possibly paused) runtime clock.

pub mod circuit;
pub mod policy;
pub mod priority;
pub mod rate_window;
pub mod retry;

pub use circuit::{CircuitPolicy, CircuitState};
pub use policy::AdmissionPolicy;
pub use priority::Priority;
pub use rate_window::{RATE_WINDOW, RateWindow};
pub use retry::RetryPolicy;
