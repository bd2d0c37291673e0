//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod arbitrator;
pub mod decision_logger;
pub mod progress;
pub mod provider;
