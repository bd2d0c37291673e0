//! Admission control
//!
//! One [`AdmissionController`] per provider gates every call through a
//! priority queue, a trailing-minute rate limit, a circuit breaker and
//! bounded retries. State is owned by the controller's dispatch loop task;
//! callers only talk to it through channels.

mod controller;
mod error;
mod queue;

pub use controller::{Admission, AdmissionController, AdmissionStats, AdmissionTicket};
pub use error::AdmissionError;
