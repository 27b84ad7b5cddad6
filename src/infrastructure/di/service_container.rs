//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::MapService;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::store::JsonFileStore;
use crate::infrastructure::traits::{Clock, FileSystem, MapStore, RealFileSystem, SystemClock};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Time source for autosave deadlines
    pub clock: Arc<dyn Clock>,

    /// Persistence adapter
    pub store: Arc<dyn MapStore>,

    pub maps: MapService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// Maps are stored as JSON files under `settings.data_dir`.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = Arc::new(JsonFileStore::new(fs.clone(), settings.data_dir.clone()));
        Self::with_deps(settings, fs, Arc::new(SystemClock), store)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        store: Arc<dyn MapStore>,
    ) -> ApplicationResult<Self> {
        let options = settings.session_options()?;
        let maps = MapService::new(store.clone(), clock.clone(), options);

        Ok(Self {
            settings: Arc::new(settings),
            fs,
            clock,
            store,
            maps,
        })
    }
}
