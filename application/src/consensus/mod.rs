//! Consensus resolution around the arbitrator port

mod engine;
mod provider_arbitrator;

pub use engine::ConsensusEngine;
pub use provider_arbitrator::ProviderArbitrator;
