//! Registration and login exchange.

use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use trails_core::error::TrailsResult;
use trails_core::types::{AuthSession, Credentials, Registration, User};
use trails_core::ClientConfig;

use crate::transport::{build_http, headers, send_json};

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Unauthenticated client for the `/auth` endpoints.
pub struct AuthClient {
    client: Client,
    config: ClientConfig,
}

impl AuthClient {
    pub fn new(config: &ClientConfig) -> TrailsResult<Self> {
        Ok(Self {
            client: build_http(config)?,
            config: config.clone(),
        })
    }

    /// Create an account. Returns the server's confirmation message.
    pub async fn register(&self, registration: &Registration) -> TrailsResult<String> {
        let registration = registration.validated()?;
        let request = self
            .client
            .post(self.config.endpoint("auth/register"))
            .headers(headers(None)?)
            .json(&registration);
        let response: MessageResponse = send_json("Register", request).await?;
        info!(username = %registration.username, "Account registered");
        Ok(response.message.unwrap_or_else(|| "Account created".to_string()))
    }

    /// Exchange credentials for a session.
    pub async fn login(&self, credentials: &Credentials) -> TrailsResult<AuthSession> {
        credentials.validate()?;
        let request = self
            .client
            .post(self.config.endpoint("auth/login"))
            .headers(headers(None)?)
            .json(credentials);
        let response: LoginResponse = send_json("Login", request).await?;
        info!(username = %credentials.username, "Logged in");
        Ok(AuthSession::new(
            response.access_token,
            response.refresh_token,
            response.user,
        ))
    }

    /// Profile of the session's user.
    pub async fn me(&self, session: &AuthSession) -> TrailsResult<User> {
        let request = self
            .client
            .get(self.config.endpoint("auth/me"))
            .headers(headers(Some(session))?);
        let response: MeResponse = send_json("Fetch profile", request).await?;
        Ok(response.user)
    }
}
