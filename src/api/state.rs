// App state shared by every handler
use axum::http::HeaderMap;
use std::sync::Arc;

use crate::config::Config;
use crate::error::ApiError;
use crate::security::{require_role, Role};
use crate::store::ContentStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ContentStore>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<dyn ContentStore>) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    /// Reject the request unless it carries a key with at least `role`.
    pub fn authorize(&self, headers: &HeaderMap, role: Role) -> Result<Role, ApiError> {
        Ok(require_role(&self.config, headers, role)?)
    }
}
