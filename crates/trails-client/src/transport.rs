//! Shared request plumbing: client construction, sending and error mapping.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use trails_core::error::{TrailsError, TrailsResult};
use trails_core::types::AuthSession;
use trails_core::ClientConfig;

/// Build the underlying HTTP client from the configuration.
pub(crate) fn build_http(config: &ClientConfig) -> TrailsResult<Client> {
    config.validate()?;
    Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| TrailsError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// JSON headers, plus the bearer token when a session is given.
pub(crate) fn headers(session: Option<&AuthSession>) -> TrailsResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(session) = session {
        let value = HeaderValue::from_str(&session.bearer()).map_err(|_| {
            TrailsError::authentication("Access token contains characters not allowed in a header")
        })?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Map a transport failure to the error taxonomy.
pub(crate) fn map_reqwest(context: &str, e: reqwest::Error) -> TrailsError {
    if e.is_timeout() {
        TrailsError::timeout(format!("{}: request timed out", context))
    } else if e.is_decode() {
        TrailsError::parse(format!("{}: {}", context, e))
    } else {
        TrailsError::Network {
            message: format!("{}: {}", context, e),
            code: trails_core::ErrorCode::NetConnectionFailed,
            source: Some(Box::new(e)),
        }
    }
}

/// Send a request and fail on any non-success status.
pub(crate) async fn send(context: &str, request: RequestBuilder) -> TrailsResult<Response> {
    let response = request.send().await.map_err(|e| map_reqwest(context, e))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "{} failed", context);
    Err(TrailsError::from_http_status(status.as_u16(), &body))
}

/// Send a request and decode its JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    context: &str,
    request: RequestBuilder,
) -> TrailsResult<T> {
    let response = send(context, request).await?;
    let body = response.text().await.map_err(|e| map_reqwest(context, e))?;
    decode(context, &body)
}

/// Send a request whose body, if any, carries nothing the caller needs.
pub(crate) async fn send_empty(context: &str, request: RequestBuilder) -> TrailsResult<()> {
    send(context, request).await.map(|_| ())
}

pub(crate) fn decode<T: DeserializeOwned>(context: &str, body: &str) -> TrailsResult<T> {
    serde_json::from_str(body)
        .map_err(|e| TrailsError::parse(format!("{}: failed to parse response: {}", context, e)))
}
