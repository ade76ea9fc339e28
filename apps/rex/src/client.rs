//! # Repository Client
//!
//! Async access to the metadata repository's view service.
//!
//! Every call is `POST {base_url}/api/{path}` with `serverName` and
//! `platformName` merged into the JSON body. The raw JSON answer is handed
//! back untouched; validation of `relatedHTTPCode` happens in the core.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors from the transport layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Cannot reach the repository.
    #[error("Cannot connect to repository at {0}")]
    ConnectionFailed(String),
    /// 429 Too Many Requests.
    #[error("Rate limited: too many requests")]
    RateLimited,
    /// The view service answered with an HTTP error status.
    #[error("Repository error ({0}): {1}")]
    ServerError(u16, String),
    /// The answer was not JSON.
    #[error("Parse error: {0}")]
    ParseError(String),
    /// The request body could not be built.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

/// Something that can post queries to a repository server.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Post `body` to `path` on the given server.
    async fn post(
        &self,
        server_name: &str,
        platform_name: &str,
        path: &str,
        body: Value,
    ) -> Result<Value, ClientError>;
}

/// Merge the server context into a request body.
pub fn with_server_context(
    body: Value,
    server_name: &str,
    platform_name: &str,
) -> Result<Value, ClientError> {
    let Value::Object(mut map) = body else {
        return Err(ClientError::InvalidBody(
            "request body must be a JSON object".to_string(),
        ));
    };
    map.insert("serverName".to_string(), Value::from(server_name));
    map.insert("platformName".to_string(), Value::from(platform_name));
    Ok(Value::Object(map))
}

/// `RepositoryClient` over HTTP.
#[derive(Clone)]
pub struct HttpRepositoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRepositoryClient {
    /// Create a client for the view service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Handle HTTP response: check status codes and parse JSON.
    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited);
        }
        if status.is_client_error() || status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ServerError(status.as_u16(), body));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl RepositoryClient for HttpRepositoryClient {
    async fn post(
        &self,
        server_name: &str,
        platform_name: &str,
        path: &str,
        body: Value,
    ) -> Result<Value, ClientError> {
        let url = format!("{}/api/{}", self.base_url, path);
        let body = with_server_context(body, server_name, platform_name)?;

        tracing::debug!(%url, server = server_name, "repository request");
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))?;
        self.handle_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_context_is_merged() {
        let body = with_server_context(json!({ "entityGUID": "e-1" }), "cocoMDS1", "platform")
            .expect("merge");
        assert_eq!(
            body,
            json!({ "entityGUID": "e-1", "serverName": "cocoMDS1", "platformName": "platform" })
        );
    }

    #[test]
    fn non_object_body_is_rejected() {
        let result = with_server_context(json!([1, 2]), "cocoMDS1", "platform");
        assert!(matches!(result, Err(ClientError::InvalidBody(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = HttpRepositoryClient::new("http://localhost:8091/", Duration::from_secs(5))
            .expect("client");
        assert_eq!(client.base_url(), "http://localhost:8091");
    }
}
