//! Cached document chunking

mod service;

pub use service::ChunkingService;
