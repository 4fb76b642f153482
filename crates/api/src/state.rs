use std::sync::Arc;

use glossary_notify_core::NotificationService;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    service: Arc<NotificationService>,
    config: AppConfig,
}

impl AppState {
    pub fn new(service: Arc<NotificationService>, config: AppConfig) -> Self {
        Self {
            inner: Arc::new(InnerState { service, config }),
        }
    }

    pub fn service(&self) -> &NotificationService {
        &self.inner.service
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }
}
