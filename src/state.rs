use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::store::{ContentStore, MemoryStore};
use crate::uploads::UploadStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ContentStore>,
    pub uploads: UploadStore,
    /// Serializes read-modify-write edits of singleton documents.
    pub edit_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ContentStore>) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone(), config.max_upload_bytes);
        Self {
            config: Arc::new(config),
            store,
            uploads,
            edit_lock: Arc::new(Mutex::new(())),
        }
    }

    /// State backed by [`MemoryStore`], for running without a database.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Arc::new(MemoryStore::new()))
    }
}
