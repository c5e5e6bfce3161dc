//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::ImportService;
use crate::config::Settings;
use crate::infrastructure::sheet::FileSheetReader;
use crate::infrastructure::store::MemoryStore;
use crate::infrastructure::traits::{OptionStore, SheetReader};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Sheet source abstraction
    pub reader: Arc<dyn SheetReader>,

    /// Persistence abstraction
    pub store: Arc<dyn OptionStore>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(FileSheetReader),
            Arc::new(MemoryStore::new()),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        reader: Arc<dyn SheetReader>,
        store: Arc<dyn OptionStore>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            reader,
            store,
        }
    }

    pub fn import_service(&self) -> ImportService {
        ImportService::new(
            Arc::clone(&self.reader),
            Arc::clone(&self.store),
            self.settings.limits.to_limits(),
        )
    }
}
