use std::sync::Arc;

use tokio::sync::RwLock;

use crate::db::ResultCache;
use crate::models::Dataset;
use crate::services::providers::AiProvider;

/// Shared application state
///
/// The dataset sits behind a read/write lock: recommendation runs take a
/// snapshot under the read lock, bulk reimport takes the write lock, so an
/// import can never interleave with an in-flight run reading the same
/// data. The result cache is the only state shared across requests beyond
/// the dataset itself.
#[derive(Clone)]
pub struct AppState {
    pub dataset: Arc<RwLock<Dataset>>,
    pub cache: ResultCache,
    pub ai_provider: Option<Arc<dyn AiProvider>>,
}

impl AppState {
    /// Creates state with an empty dataset.
    pub fn new(ai_provider: Option<Arc<dyn AiProvider>>) -> Self {
        Self {
            dataset: Arc::new(RwLock::new(Dataset::default())),
            cache: ResultCache::new(),
            ai_provider,
        }
    }
}
