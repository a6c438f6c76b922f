// Gateway module for api - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod gateway;
mod retry;
mod stages;
mod transport;

// Public re-exports - the ONLY way to reach the HTTP API
pub use gateway::ApiGateway;
pub use retry::RetryPolicy;
pub use stages::{
    BearerAuth, DefaultContentType, RequestStage, ResponseStage, SessionAccess,
    SignOutOnUnauthorized,
};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, RequestBody, Transport};

#[cfg(test)]
pub use transport::MockTransport;
