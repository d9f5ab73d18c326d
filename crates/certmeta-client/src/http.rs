//! Shared HTTP plumbing for the CA and CLM clients.
//!
//! Every call goes through [`RetryPolicy::execute`]; status codes are mapped to
//! [`ClientError`] variants so the policy can tell transient failures from
//! permanent ones.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;

const USER_AGENT: &str = concat!("certmeta-sync/", env!("CARGO_PKG_VERSION"));
const NO_QUERY: &[(&str, String)] = &[];

#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    /// Always ends with `/` so relative paths join underneath it.
    base_url: Url,
    credentials: Credentials,
    http_client: Client,
    retry: RetryPolicy,
    headers: Vec<(&'static str, &'static str)>,
}

impl HttpTransport {
    pub(crate) fn new(
        base_url: &str,
        credentials: Credentials,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> ClientResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;
        Self::with_http_client(base_url, credentials, http_client, retry)
    }

    pub(crate) fn with_http_client(
        base_url: &str,
        credentials: Credentials,
        http_client: Client,
        retry: RetryPolicy,
    ) -> ClientResult<Self> {
        let normalized = format!("{}/", base_url.trim().trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| ClientError::InvalidConfig(format!("Invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "Base URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            base_url,
            credentials,
            http_client,
            retry,
            headers: Vec::new(),
        })
    }

    /// Add a header sent with every request.
    pub(crate) fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub(crate) fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidConfig(format!("Invalid request path '{path}': {e}")))
    }

    pub(crate) async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> ClientResult<T>
    where
        T: DeserializeOwned + Send,
    {
        let url = &self.url(path)?;
        let operation = format!("GET {path}");
        self.retry
            .execute(&operation, move || self.send_once(Method::GET, url, query, None))
            .await
    }

    pub(crate) async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned + Send,
        B: Serialize + ?Sized,
    {
        let url = &self.url(path)?;
        let body = &encode_body(body)?;
        let operation = format!("POST {path}");
        self.retry
            .execute(&operation, move || self.send_once(Method::POST, url, NO_QUERY, Some(body)))
            .await
    }

    pub(crate) async fn put<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned + Send,
        B: Serialize + ?Sized,
    {
        let url = &self.url(path)?;
        let body = &encode_body(body)?;
        let operation = format!("PUT {path}");
        self.retry
            .execute(&operation, move || self.send_once(Method::PUT, url, NO_QUERY, Some(body)))
            .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &Url,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> ClientResult<T> {
        debug!("{} {}", method, url);
        let mut builder = self
            .http_client
            .request(method, url.clone())
            .header("Accept", "application/json");
        for (name, value) in &self.headers {
            builder = builder.header(*name, *value);
        }
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.credentials.apply(builder).send().await?;
        handle_response(response).await
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> ClientResult<Value> {
    serde_json::to_value(body).map_err(|e| ClientError::ParseError(format!("Failed to encode request body: {e}")))
}

/// Decode a success body; an empty body decodes as JSON `null` so callers can
/// ask for `()` or `Option<_>`.
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();

    if status.is_success() {
        let body = response.text().await?;
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| ClientError::ParseError(format!("Failed to parse response: {e}")))
    } else {
        handle_error_response(response).await
    }
}

async fn handle_error_response<T>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();

    let retry_after = response
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());

    match status {
        StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("Remote service rate limited, retry after {:?}s", retry_after);
            Err(ClientError::RateLimited {
                retry_after_secs: retry_after,
            })
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ClientError::AuthError(format!(
            "Authentication failed ({}): {body}",
            status.as_u16()
        ))),
        _ => {
            let detail = if body.is_empty() {
                format!("HTTP {status}")
            } else {
                body
            };
            Err(ClientError::Api {
                status: status.as_u16(),
                detail,
            })
        }
    }
}
