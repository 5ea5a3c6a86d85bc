//! Shared HTTP plumbing: URL building, bearer-token injection and response
//! classification. Each call performs exactly one request; nothing here
//! retries.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;

/// HTTP client bound to one backend and one session.
///
/// Cheap to clone; clones share the connection pool and the session.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
}

impl HttpTransport {
    /// Build a transport for the configured backend.
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Self::with_client(client, &config.api_url, session)
    }

    /// Build a transport reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_url: &str,
        session: Arc<Session>,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(api_url)
            .map_err(|e| ClientError::Config(format!("Invalid API URL '{api_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "API URL '{api_url}' cannot carry path segments"
            )));
        }
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one.
    pub fn url<I, S>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }
        url
    }

    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.session.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// `GET url?query`, returning the JSON body.
    pub async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<Value, ClientError> {
        let builder = self.request(Method::GET, url).await.query(query);
        self.execute(builder).await
    }

    /// Send a JSON body with `method`, returning the JSON response.
    pub async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<Value, ClientError> {
        let builder = self.request(method, url).await.json(body);
        self.execute(builder).await
    }

    /// `DELETE url`, discarding any body.
    pub async fn delete(&self, url: Url) -> Result<(), ClientError> {
        let builder = self.request(Method::DELETE, url).await;
        self.execute(builder).await.map(|_| ())
    }

    // ---- private helpers ----

    async fn execute(&self, builder: RequestBuilder) -> Result<Value, ClientError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.client.execute(request).await.map_err(|e| {
            tracing::error!(%method, %url, error = %e, "Request failed");
            ClientError::Request(e)
        })?;

        let status = response.status();
        tracing::debug!(%method, %url, status = status.as_u16(), "Response received");
        Self::parse_response(response).await.inspect_err(|e| {
            tracing::warn!(%method, %url, error = %e, "Request unsuccessful");
        })
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ClientError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful response body as JSON. An empty body (e.g.
    /// `204 No Content`) becomes `null`.
    async fn parse_response(response: reqwest::Response) -> Result<Value, ClientError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Unwrap a `{"data": ...}` envelope if present.
pub fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
