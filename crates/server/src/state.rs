use std::sync::Arc;

use ludex_core::{Config, GameLibrary, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    library: Arc<dyn GameLibrary>,
}

impl AppState {
    pub fn new(config: Config, library: Arc<dyn GameLibrary>) -> Self {
        Self { config, library }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn library(&self) -> &dyn GameLibrary {
        self.library.as_ref()
    }
}
