use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::retry::RetryPolicy;
use super::stages::{
    BearerAuth, DefaultContentType, RequestStage, ResponseStage, SessionAccess,
    SignOutOnUnauthorized,
};
use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::utils::ApiError;

/// The single path every feature module takes to the API.
///
/// Request stages run in order before the transport; response stages run on
/// every response that arrived, before the status is turned into an error.
pub struct ApiGateway {
    transport: Arc<dyn Transport>,
    request_stages: Vec<Box<dyn RequestStage>>,
    response_stages: Vec<Box<dyn ResponseStage>>,
}

impl ApiGateway {
    /// Gateway with body content types, bearer injection and sign-out on 401
    /// wired to `session`
    pub fn new(transport: Arc<dyn Transport>, session: Arc<dyn SessionAccess>) -> Self {
        Self::bare(transport)
            .with_request_stage(DefaultContentType)
            .with_request_stage(BearerAuth::new(Arc::clone(&session)))
            .with_response_stage(SignOutOnUnauthorized::new(session))
    }

    /// Gateway without any middleware
    pub fn bare(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            request_stages: Vec::new(),
            response_stages: Vec::new(),
        }
    }

    pub fn with_request_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.request_stages.push(Box::new(stage));
        self
    }

    pub fn with_response_stage(mut self, stage: impl ResponseStage + 'static) -> Self {
        self.response_stages.push(Box::new(stage));
        self
    }

    /// Send a request through all stages. Non-success statuses come back as
    /// errors after the response stages have seen them.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        for stage in &self.request_stages {
            stage.apply(&mut request);
        }

        debug!("{} {}", request.method, request.path);
        let response = self.transport.execute(request.clone()).await?;
        debug!("{} {} -> {}", request.method, request.path, response.status);

        for stage in &self.response_stages {
            stage.observe(&request, &response);
        }

        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let mut request = ApiRequest::get(path);
        request.query = query.to_vec();
        self.send(request).await?.decode()
    }

    /// GET with the query retry policy applied
    pub async fn query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
        policy: &RetryPolicy,
    ) -> Result<T, ApiError> {
        policy.run(move || self.get_json(path, query)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::post(path).json(serde_json::to_value(body)?);
        self.send(request).await?.decode()
    }

    /// POST a JSON body, ignoring the response body
    pub async fn post_json_unit<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let request = ApiRequest::post(path).json(serde_json::to_value(body)?);
        self.send(request).await.map(|_| ())
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::post(path).form(fields);
        self.send(request).await?.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::MockTransport;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeSession {
        token: Mutex<Option<String>>,
        revocations: AtomicUsize,
    }

    impl SessionAccess for FakeSession {
        fn bearer_token(&self) -> Option<String> {
            self.token.lock().clone()
        }

        fn revoke(&self) {
            *self.token.lock() = None;
            self.revocations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn gateway(mock: MockTransport, session: &Arc<FakeSession>) -> ApiGateway {
        let access: Arc<dyn SessionAccess> = session.clone();
        ApiGateway::new(Arc::new(mock), access)
    }

    #[tokio::test]
    async fn test_bearer_reads_token_at_send_time() {
        let session = Arc::new(FakeSession::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut mock = MockTransport::new();
        let recorder = Arc::clone(&seen);
        mock.expect_execute().times(3).returning(move |req| {
            recorder
                .lock()
                .push(req.authorization().map(str::to_string));
            Ok(ApiResponse::json(200, &json!([])))
        });
        let gateway = gateway(mock, &session);

        gateway.get_json::<Value>("/rides/", &[]).await.unwrap();
        *session.token.lock() = Some("abc123".to_string());
        gateway.get_json::<Value>("/rides/", &[]).await.unwrap();
        *session.token.lock() = None;
        gateway.get_json::<Value>("/rides/", &[]).await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![None, Some("Bearer abc123".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_caller_authorization_is_replaced() {
        let session = Arc::new(FakeSession::default());
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| req.authorization().is_none())
            .times(1)
            .returning(|_| Ok(ApiResponse::json(200, &json!({}))));
        let gateway = gateway(mock, &session);

        let mut request = ApiRequest::get("/users/me");
        request.headers.insert(
            reqwest::header::AUTHORIZATION,
            reqwest::header::HeaderValue::from_static("Bearer forged"),
        );
        gateway.send(request).await.unwrap();
    }

    #[tokio::test]
    async fn test_unauthorized_signs_out_and_propagates() {
        let session = Arc::new(FakeSession::default());
        *session.token.lock() = Some("expired".to_string());

        let mut mock = MockTransport::new();
        mock.expect_execute().times(1).returning(|_| {
            Ok(ApiResponse::json(
                401,
                &json!({"detail": "Could not validate credentials"}),
            ))
        });
        let gateway = gateway(mock, &session);

        let err = gateway
            .get_json::<Value>("/instructors/search", &[])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::Unauthorized {
                detail: Some("Could not validate credentials".to_string())
            }
        );
        assert_eq!(session.revocations.load(Ordering::SeqCst), 1);
        assert_eq!(session.bearer_token(), None);
    }

    #[tokio::test]
    async fn test_other_failures_leave_session_alone() {
        let session = Arc::new(FakeSession::default());
        *session.token.lock() = Some("abc123".to_string());

        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| req.path == "/users/")
            .times(1)
            .returning(|_| Ok(ApiResponse::json(400, &json!({"detail": "Email taken"}))));
        mock.expect_execute()
            .withf(|req| req.path == "/rides/")
            .times(1)
            .returning(|_| Err(ApiError::Network("connection refused".into())));
        let gateway = gateway(mock, &session);

        let err = gateway.post_json_unit("/users/", &json!({})).await.unwrap_err();
        assert_eq!(err.detail(), Some("Email taken"));
        let err = gateway.get_json::<Value>("/rides/", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));

        assert_eq!(session.revocations.load(Ordering::SeqCst), 0);
        assert_eq!(session.bearer_token().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_form_and_json_bodies() {
        let session = Arc::new(FakeSession::default());
        let mut mock = MockTransport::new();
        mock.expect_execute()
            .withf(|req| {
                req.path == "/login/access-token"
                    && req.body
                        == crate::api::RequestBody::Form(vec![
                            ("username".to_string(), "a@b.c".to_string()),
                            ("password".to_string(), "pw".to_string()),
                        ])
            })
            .times(1)
            .returning(|_| {
                Ok(ApiResponse::json(
                    200,
                    &json!({"access_token": "t", "token_type": "bearer"}),
                ))
            });
        let gateway = gateway(mock, &session);

        let token: crate::models::TokenResponse = gateway
            .post_form(
                "/login/access-token",
                vec![
                    ("username".to_string(), "a@b.c".to_string()),
                    ("password".to_string(), "pw".to_string()),
                ],
            )
            .await
            .unwrap();
        assert_eq!(token.access_token, "t");
    }

    #[tokio::test]
    async fn test_query_retries_server_errors() {
        let session = Arc::new(FakeSession::default());
        let mut mock = MockTransport::new();
        let attempts = AtomicUsize::new(0);
        mock.expect_execute().times(2).returning(move |_| {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(ApiResponse::new(502, "bad gateway"))
            } else {
                Ok(ApiResponse::json(200, &json!([1, 2])))
            }
        });
        let gateway = gateway(mock, &session);

        let policy = RetryPolicy {
            retries: 2,
            base_delay: std::time::Duration::from_millis(1),
            max_delay: std::time::Duration::from_millis(1),
        };
        let values: Vec<i64> = gateway.query("/rides/", &[], &policy).await.unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_bodies_carry_default_content_type() {
        use reqwest::header::{HeaderValue, CONTENT_TYPE};

        let session = Arc::new(FakeSession::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut mock = MockTransport::new();
        let recorder = Arc::clone(&seen);
        mock.expect_execute().times(4).returning(move |req| {
            recorder.lock().push(
                req.headers
                    .get(CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string),
            );
            Ok(ApiResponse::json(200, &json!({})))
        });
        let gateway = gateway(mock, &session);

        gateway.get_json::<Value>("/users/me", &[]).await.unwrap();
        gateway.post_json_unit("/users/", &json!({})).await.unwrap();
        gateway
            .post_form::<Value>("/login/access-token", vec![])
            .await
            .unwrap();
        let mut custom = ApiRequest::post("/rides/").json(json!({}));
        custom.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/merge-patch+json"),
        );
        gateway.send(custom).await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                None,
                Some(crate::constants::DEFAULT_CONTENT_TYPE.to_string()),
                Some(crate::constants::FORM_CONTENT_TYPE.to_string()),
                Some("application/merge-patch+json".to_string()),
            ]
        );
    }
}
