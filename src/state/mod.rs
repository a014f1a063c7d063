use crate::application::{
    GuardConfig, NavigationGuard, ReviewsService, RouteTable, Router, SessionManager,
};
use crate::infra::app_config::AppConfig;
use crate::infra::http::{HttpClient, ReqwestClient};
use crate::infra::storage::{FileStorage, KeyValueStorage, SessionStore};
use std::sync::Arc;

/// Every long-lived service, built once at startup and handed to consumers.
pub struct AppState {
    pub config: AppConfig,
    pub http: Arc<dyn HttpClient>,
    pub session: Arc<SessionManager>,
    pub reviews: ReviewsService,
    pub router: Router,
}

impl AppState {
    /// Production wiring: `reqwest` transport and on-disk token storage.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let http = ReqwestClient::new(config.api_base_url.clone(), config.request_timeout())?;
        let storage = FileStorage::new(config.storage_path());
        log::debug!(
            "Using API {} with storage {}",
            http.base_url(),
            storage.path().display()
        );
        Ok(Self::with_parts(config, Arc::new(http), Arc::new(storage)))
    }

    pub fn with_parts(
        config: AppConfig,
        http: Arc<dyn HttpClient>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let session = SessionManager::start(Arc::clone(&http), SessionStore::new(storage));
        let guard = NavigationGuard::new(Arc::clone(&session), GuardConfig::default());
        let router = Router::new(RouteTable::default(), guard);
        let reviews = ReviewsService::new(Arc::clone(&http));
        Self {
            config,
            http,
            session,
            reviews,
            router,
        }
    }
}
