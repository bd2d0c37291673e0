//! Infrastructure layer for docquorum
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: command-backed providers, the JSONL decision
//! log, and configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileAdmissionConfig, FileAdmissionOverride, FileChunkingConfig,
    FileConfig, FileLoggingConfig, FileOutputConfig, FileProviderConfig, FileSizeBand,
};
pub use logging::JsonlDecisionLogger;
pub use providers::{CommandProvider, ProviderRegistry};
