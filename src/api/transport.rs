use async_trait::async_trait;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::constants::{DEFAULT_CONTENT_TYPE, FORM_CONTENT_TYPE};
use crate::utils::ApiError;

/// Body of an outgoing request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

/// Outgoing request, relative to the gateway's base URL
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    /// Value of the Authorization header, if one is attached
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
    }

    /// Content type the body will be sent with
    pub fn content_type(&self) -> Option<&'static str> {
        match self.body {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some(DEFAULT_CONTENT_TYPE),
            RequestBody::Form(_) => Some(FORM_CONTENT_TYPE),
        }
    }
}

/// Status and raw body of a received response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode the body as JSON
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// The wire underneath the gateway
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange. Non-success statuses are returned as responses,
    /// only failures to get a response at all are errors.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Production transport over reqwest
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(&request.path);
        let mut builder = self
            .client
            .request(request.method, &url)
            .headers(request.headers);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            // Content-Type already set by the gateway is kept by reqwest
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::get("/instructors/search");

        assert_eq!(request.method, Method::GET);
        assert!(request.query.is_empty());
        assert_eq!(request.content_type(), None);
        assert_eq!(request.authorization(), None);

        let form = ApiRequest::post("/login/access-token")
            .form(vec![("username".into(), "a".into())]);
        assert_eq!(form.content_type(), Some(FORM_CONTENT_TYPE));

        let body = ApiRequest::post("/users/").json(json!({"email": "a"}));
        assert_eq!(body.content_type(), Some(DEFAULT_CONTENT_TYPE));
    }

    #[test]
    fn test_url_joining() {
        let transport =
            ReqwestTransport::new("http://localhost:8000/api/v1/", Duration::from_secs(10))
                .unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000/api/v1");
        assert_eq!(
            transport.url_for("/users/me"),
            "http://localhost:8000/api/v1/users/me"
        );
        assert_eq!(
            transport.url_for("rides/"),
            "http://localhost:8000/api/v1/rides/"
        );
    }

    #[test]
    fn test_response_helpers() {
        let response = ApiResponse::json(200, &json!({"access_token": "abc123"}));
        assert!(response.is_success());
        let value: Value = response.decode().unwrap();
        assert_eq!(value["access_token"], "abc123");

        assert!(ApiResponse::new(401, "").is_unauthorized());
        assert!(matches!(
            ApiResponse::new(200, "nope").decode::<Value>(),
            Err(ApiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is almost never listening
        let transport =
            ReqwestTransport::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let result = transport.execute(ApiRequest::get("/users/me")).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
