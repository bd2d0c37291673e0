//! Provider adapters
//!
//! Models are reached through external commands; the registry turns
//! `[providers.<id>]` tables into ready-to-use slots.

pub mod command;
pub mod registry;

pub use command::CommandProvider;
pub use registry::ProviderRegistry;
