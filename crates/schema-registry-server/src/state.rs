//! Shared application state handed to every handler.

use std::sync::Arc;

use schema_registry_core::EngineBackend;

use crate::metrics::RegistryMetrics;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn EngineBackend>,
    pub metrics: Arc<RegistryMetrics>,
}
