//! Application-level configuration.
//!
//! - [`ExecutionParams`] — per-call model parameters and prompt budgeting
//!
//! Domain policies (admission, chunking, consensus) are configured in the
//! domain layer; this module only holds what the use cases need on top.

pub mod execution_params;

pub use execution_params::ExecutionParams;
