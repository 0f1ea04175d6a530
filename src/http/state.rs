use crate::config::Config;
use crate::services::Services;
use crate::session::SessionHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Collaborators injected into every new session
    pub services: Services,

    /// Live voice sessions (session_id → handle)
    pub sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl AppState {
    pub fn new(config: Config, services: Services) -> Self {
        Self {
            config: Arc::new(config),
            services,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
