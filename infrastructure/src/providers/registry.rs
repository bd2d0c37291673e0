//! Provider registry
//!
//! Builds one [`CommandProvider`] and one [`AdmissionController`] per
//! configured provider. The arbitrator reuses the controller of a provider
//! with the same id, so its calls count against the same limits.

use super::command::CommandProvider;
use crate::config::{FileConfig, FileProviderConfig};
use docquorum_application::{
    AdmissionController, ProviderArbitrator, ProviderSlot,
    ports::provider::Provider,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Providers and arbitrator built from configuration.
pub struct ProviderRegistry {
    slots: Vec<ProviderSlot>,
    arbitrator: Option<Arc<ProviderArbitrator>>,
    controllers: HashMap<String, Arc<AdmissionController>>,
}

impl ProviderRegistry {
    /// Build every enabled provider.
    ///
    /// Must be called inside a Tokio runtime: each admission controller
    /// spawns its dispatch loop. Invalid admission values have already
    /// been reported by [`FileConfig::validate`] and fall back to defaults.
    pub fn from_config(config: &FileConfig) -> Self {
        let mut controllers = HashMap::new();
        let mut controller_for = |id: &str, entry: &FileProviderConfig| {
            controllers
                .entry(id.to_string())
                .or_insert_with(|| {
                    let (policy, _) = config.admission_for(entry);
                    debug!(
                        "Admission for {}: {} rpm, {} tokens/min, queue {}",
                        id,
                        policy.requests_per_minute,
                        policy.token_budget_per_minute,
                        policy.max_queue_depth
                    );
                    Arc::new(AdmissionController::new(id, policy))
                })
                .clone()
        };

        let slots: Vec<ProviderSlot> = config
            .answering_providers()
            .map(|(id, entry)| ProviderSlot {
                id: id.clone(),
                model: entry.model.clone(),
                context_tokens: entry.context_tokens,
                provider: command_provider(id, entry),
                controller: controller_for(id, entry),
            })
            .collect();

        let arbitrator = config.arbitrator_provider().map(|(id, entry)| {
            let arbitrator = ProviderArbitrator::new(
                command_provider(id, entry),
                controller_for(id, entry),
                entry.model.clone(),
            )
            .with_params(config.execution.clone())
            .with_policy(config.consensus);
            Arc::new(arbitrator)
        });

        info!(
            "Configured {} answering provider(s){}",
            slots.len(),
            config
                .arbitrator_provider()
                .map(|(id, _)| format!(", arbitrator {}", id))
                .unwrap_or_default()
        );

        Self {
            slots,
            arbitrator,
            controllers,
        }
    }

    /// Answering providers, in id order.
    pub fn slots(&self) -> &[ProviderSlot] {
        &self.slots
    }

    pub fn arbitrator(&self) -> Option<Arc<ProviderArbitrator>> {
        self.arbitrator.clone()
    }

    pub fn controller(&self, id: &str) -> Option<&Arc<AdmissionController>> {
        self.controllers.get(id)
    }

    /// Clear every controller's queue, rate window and circuit.
    pub fn reset(&self) {
        for controller in self.controllers.values() {
            controller.reset();
        }
    }

    /// Stop every controller; queued operations are rejected.
    pub fn shutdown(&self) {
        for controller in self.controllers.values() {
            controller.shutdown();
        }
    }
}

fn command_provider(id: &str, entry: &FileProviderConfig) -> Arc<dyn Provider> {
    Arc::new(
        CommandProvider::new(id, entry.command.clone())
            .with_args(entry.args.clone())
            .with_timeout(entry.timeout()),
    )
}
