use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::handle::SessionHandle;
use super::state::Session;
use crate::api::ApiGateway;
use crate::constants::{
    PROFILE_ENDPOINT, SIGN_IN_FALLBACK_MESSAGE, SIGN_UP_FALLBACK_MESSAGE, TOKEN_ENDPOINT,
    USERS_ENDPOINT,
};
use crate::models::{Credentials, Profile, RegistrationRequest, TokenResponse};
use crate::utils::{ApiError, SessionError};

/// Sign-in, sign-up and sign-out on top of the shared session.
///
/// Only one sign-in or sign-up runs at a time; an overlapping call is
/// rejected with [`SessionError::InProgress`] before it touches anything.
pub struct SessionStore {
    session: Arc<SessionHandle>,
    gateway: Arc<ApiGateway>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the attempt ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SessionStore {
    pub fn new(session: Arc<SessionHandle>, gateway: Arc<ApiGateway>) -> Self {
        Self {
            session,
            gateway,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn handle(&self) -> &Arc<SessionHandle> {
        &self.session
    }

    pub fn snapshot(&self) -> Session {
        self.session.snapshot()
    }

    /// Whether a sign-in or sign-up is running
    #[cfg(test)]
    fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<InFlight<'_>, SessionError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| SessionError::InProgress)
    }

    /// Exchange credentials for a token, then fetch the caller's profile
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Profile, SessionError> {
        let _guard = self.begin()?;
        self.session.update(Session::begin_attempt);
        self.authenticate(credentials).await
    }

    /// Create an account and sign straight into it
    pub async fn sign_up(&self, request: &RegistrationRequest) -> Result<Profile, SessionError> {
        let _guard = self.begin()?;
        self.session.update(Session::begin_attempt);

        if let Err(err) = self.gateway.post_json_unit(USERS_ENDPOINT, request).await {
            let message = user_message(&err, SIGN_UP_FALLBACK_MESSAGE);
            warn!("Account creation for {} failed: {}", request.email, err);
            self.session
                .update(|s| s.fail_registration(message.clone()));
            return Err(SessionError::Rejected {
                message,
                source: err,
            });
        }

        info!("Account created for {}, signing in", request.email);
        self.authenticate(&request.credentials()).await
    }

    /// Synchronous, no network call, idempotent
    pub fn sign_out(&self) {
        self.session.sign_out();
        info!("Signed out");
    }

    pub fn clear_error(&self) {
        self.session.clear_error();
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Profile, SessionError> {
        match self.exchange(credentials).await {
            Ok((token, profile)) => {
                info!("Signed in as {}", profile.email);
                let committed = profile.clone();
                self.session.update(move |s| s.commit(token, committed));
                Ok(profile)
            }
            Err(err) => {
                let message = user_message(&err, SIGN_IN_FALLBACK_MESSAGE);
                warn!("Sign-in for {} failed: {}", credentials.identifier, err);
                self.session.update(|s| s.fail(message.clone()));
                Err(SessionError::Rejected {
                    message,
                    source: err,
                })
            }
        }
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<(String, Profile), ApiError> {
        let issued: TokenResponse = self
            .gateway
            .post_form(TOKEN_ENDPOINT, credentials.to_form())
            .await?;

        // The profile request picks the token up through the gateway
        let token = issued.access_token;
        self.session.update(|s| s.hold_token(token.clone()));

        let profile: Profile = self.gateway.get_json(PROFILE_ENDPOINT, &[]).await?;
        Ok((token, profile))
    }
}

fn user_message(err: &ApiError, fallback: &str) -> String {
    err.detail()
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
