use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::api::{ApiGateway, ReqwestTransport, Transport};
use crate::app::{get_data_dir, Config};
use crate::instructors::InstructorSearch;
use crate::rides::RideService;
use crate::session::{SessionHandle, SessionStore};
use crate::storage::LocalStorage;

/// Global application state.
///
/// Built once per process. Every service shares the same session handle and
/// gateway, so a 401 seen by any of them signs everyone out.
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Live session
    pub session: Arc<SessionHandle>,
    /// Authenticated HTTP access
    pub gateway: Arc<ApiGateway>,
    /// Sign-in, sign-up, sign-out
    pub auth: SessionStore,
    pub instructors: InstructorSearch,
    pub rides: RideService,
}

impl AppState {
    /// Restore the persisted session and wire the services to the real API
    pub async fn bootstrap(config: Config) -> Result<Self> {
        let storage_dir = match &config.storage.dir {
            Some(dir) => dir.clone(),
            None => get_data_dir()?,
        };
        let storage = LocalStorage::open(&storage_dir)
            .with_context(|| format!("Failed to open storage at {}", storage_dir.display()))?;
        debug!("Session storage at {}", storage.root().display());
        let session = Arc::new(SessionHandle::restore(storage, &config.storage.session_key).await);

        let transport = ReqwestTransport::new(&config.api.base_url, config.api.timeout())
            .context("Failed to build HTTP client")?;

        Ok(Self::assemble(config, session, Arc::new(transport)))
    }

    /// Wire the services around an existing session and transport
    pub fn assemble(
        config: Config,
        session: Arc<SessionHandle>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let gateway = Arc::new(ApiGateway::new(transport, session.clone()));
        let retry = config.queries.retry_policy();

        let auth = SessionStore::new(session.clone(), gateway.clone());
        let instructors = InstructorSearch::new(
            gateway.clone(),
            config.search.default_radius_km,
            Duration::from_secs(config.search.freshness_secs),
            retry,
        );
        let rides = RideService::new(
            gateway.clone(),
            session.clone(),
            Duration::from_secs(config.queries.stale_secs),
            retry,
        );

        Self {
            config,
            session,
            gateway,
            auth,
            instructors,
            rides,
        }
    }

    /// Wait for pending session writes before the process exits
    pub async fn shutdown(&self) {
        self.session.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResponse, MockTransport};
    use crate::constants::{INSTRUCTOR_SEARCH_ENDPOINT, PROFILE_ENDPOINT, TOKEN_ENDPOINT};
    use crate::models::{Credentials, SearchParams};
    use crate::utils::ApiError;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unauthorized_search_signs_out_shared_session() {
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| req.path == TOKEN_ENDPOINT)
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::json(
                    200,
                    &json!({"access_token": "abc123", "token_type": "bearer"}),
                ))
            });
        mock.expect_execute()
            .withf(|req| req.path == PROFILE_ENDPOINT)
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::json(
                    200,
                    &json!({"id": 1, "email": "user@test.com", "full_name": "Test User"}),
                ))
            });
        mock.expect_execute()
            .withf(|req| {
                req.path == INSTRUCTOR_SEARCH_ENDPOINT
                    && req.authorization() == Some("Bearer abc123")
            })
            .times(1)
            .returning(|_| Ok(ApiResponse::json(401, &json!({"detail": "Token expired"}))));

        let state = AppState::assemble(
            Config::default(),
            Arc::new(SessionHandle::in_memory()),
            Arc::new(mock),
        );

        state
            .auth
            .sign_in(&Credentials::new("user@test.com", "123456"))
            .await
            .unwrap();
        assert!(state.session.is_authenticated());

        let err = state
            .instructors
            .search(SearchParams::at(-23.55, -46.63))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert!(!state.session.is_authenticated());
        assert_eq!(state.session.token(), None);
    }

    #[tokio::test]
    async fn test_bootstrap_uses_configured_storage_dir() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.dir = Some(temp_dir.path().join("data"));

        let state = AppState::bootstrap(config).await.unwrap();
        assert!(!state.session.is_authenticated());
        assert!(temp_dir.path().join("data").is_dir());
        state.shutdown().await;
    }
}
