//! Shared application state.

use domain_notifications::NotificationService;
use resource_handler::DocumentStore;
use std::sync::Arc;

use crate::config::Config;

/// Everything the routers are built from. Cloning shares the store and the
/// mail transport.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub notifications: NotificationService,
}
