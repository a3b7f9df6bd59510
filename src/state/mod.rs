mod account;
mod hunt;
pub mod session;
mod submission;

use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::store::{HuntStore, MemoryStore};
use crate::upload::UploadStore;

pub use hunt::{ActionOutcome, HuntAction, HuntReport};
pub use session::{Session, SessionStore};
pub use submission::ReviewError;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HuntStore>,
    pub sessions: SessionStore,
    pub uploads: UploadStore,
    pub auth_config: AuthConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn HuntStore>, auth_config: AuthConfig, uploads: UploadStore) -> Self {
        let sessions = SessionStore::new(chrono::Duration::days(auth_config.session_ttl_days));
        Self {
            store,
            sessions,
            uploads,
            auth_config,
        }
    }

    /// Memory-only state with default auth settings
    pub fn in_memory(uploads: UploadStore) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            AuthConfig::default(),
            uploads,
        )
    }
}
