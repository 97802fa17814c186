use std::sync::Arc;

use reseed_core::indexer::BulkSearcher;
use reseed_core::store::{ClientSearcheeStore, ConflictRuleStore, DecisionStore, IndexerStore};
use reseed_core::{Authenticator, Config};

use crate::metrics::build_registry;

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    decisions: DecisionStore,
    rules: ConflictRuleStore,
    indexers: IndexerStore,
    clients: ClientSearcheeStore,
    bulk_searcher: Option<Arc<dyn BulkSearcher>>,
    registry: prometheus::Registry,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        decisions: DecisionStore,
        rules: ConflictRuleStore,
        indexers: IndexerStore,
        clients: ClientSearcheeStore,
        bulk_searcher: Option<Arc<dyn BulkSearcher>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            decisions,
            rules,
            indexers,
            clients,
            bulk_searcher,
            registry: build_registry(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn decisions(&self) -> &DecisionStore {
        &self.decisions
    }

    pub fn rules(&self) -> &ConflictRuleStore {
        &self.rules
    }

    pub fn indexers(&self) -> &IndexerStore {
        &self.indexers
    }

    pub fn clients(&self) -> &ClientSearcheeStore {
        &self.clients
    }

    /// The bulk search dispatcher (if an indexer backend is configured)
    pub fn bulk_searcher(&self) -> Option<&Arc<dyn BulkSearcher>> {
        self.bulk_searcher.as_ref()
    }

    pub fn registry(&self) -> &prometheus::Registry {
        &self.registry
    }
}
