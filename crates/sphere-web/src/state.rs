//! Application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use sphere_core::{DirectoryClient, GraphBackend, InferenceEngine};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GraphBackend>,
    /// `None` when no directory credentials are configured.
    pub directory: Option<Arc<dyn DirectoryClient>>,
    pub engine: Arc<InferenceEngine>,
    /// Held for the duration of a sync; only one may run at a time.
    pub sync_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn GraphBackend>,
        directory: Option<Arc<dyn DirectoryClient>>,
        engine: InferenceEngine,
    ) -> Self {
        Self {
            store,
            directory,
            engine: Arc::new(engine),
            sync_lock: Arc::new(Mutex::new(())),
        }
    }
}
