use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::sync::Arc;
use tracing::warn;

use super::transport::{ApiRequest, ApiResponse};

/// Live view of the session, read by the middleware at call time
pub trait SessionAccess: Send + Sync {
    /// Token currently held, if any
    fn bearer_token(&self) -> Option<String>;

    /// Drop the session because the server rejected its credential
    fn revoke(&self);
}

/// Runs on every outgoing request before it reaches the transport
pub trait RequestStage: Send + Sync {
    fn apply(&self, request: &mut ApiRequest);
}

/// Runs on every response that arrived, before status checking
pub trait ResponseStage: Send + Sync {
    fn observe(&self, request: &ApiRequest, response: &ApiResponse);
}

/// Labels request bodies with their default content type unless the caller
/// already chose one
pub struct DefaultContentType;

impl RequestStage for DefaultContentType {
    fn apply(&self, request: &mut ApiRequest) {
        if let Some(content_type) = request.content_type() {
            request
                .headers
                .entry(CONTENT_TYPE)
                .or_insert(HeaderValue::from_static(content_type));
        }
    }
}

/// Attaches the session's current token as a bearer credential
pub struct BearerAuth {
    session: Arc<dyn SessionAccess>,
}

impl BearerAuth {
    pub fn new(session: Arc<dyn SessionAccess>) -> Self {
        Self { session }
    }
}

impl RequestStage for BearerAuth {
    fn apply(&self, request: &mut ApiRequest) {
        // Only the gateway decides what credential goes out
        request.headers.remove(AUTHORIZATION);

        let Some(token) = self.session.bearer_token() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Held token is not a valid header value, sending unauthenticated"),
        }
    }
}

/// Signs the session out whenever the server answers 401
pub struct SignOutOnUnauthorized {
    session: Arc<dyn SessionAccess>,
}

impl SignOutOnUnauthorized {
    pub fn new(session: Arc<dyn SessionAccess>) -> Self {
        Self { session }
    }
}

impl ResponseStage for SignOutOnUnauthorized {
    fn observe(&self, request: &ApiRequest, response: &ApiResponse) {
        if response.is_unauthorized() {
            warn!(
                "401 Unauthorized from {} {} - signing out",
                request.method, request.path
            );
            self.session.revoke();
        }
    }
}
