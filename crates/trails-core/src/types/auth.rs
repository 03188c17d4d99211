//! Authenticated user context.
//!
//! The session is an explicit value created by a login exchange and passed to
//! whatever issues requests. Dropping it (or calling [`AuthSession::logout`])
//! is the end of its lifecycle; nothing here touches disk.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;
use crate::error::{ErrorCode, TrailsError, TrailsResult};

/// Public profile of the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Credentials for the login exchange. `username` may also be an email.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields are required.
    pub fn validate(&self) -> TrailsResult<()> {
        if self.username.trim().is_empty() {
            return Err(TrailsError::missing_field("username"));
        }
        if self.password.is_empty() {
            return Err(TrailsError::missing_field("password"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Minimum password length the server accepts at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Account registration request.
#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Trim and check the fields the same way the server does.
    ///
    /// The email format is left to the server, which stores whatever it gets.
    pub fn validated(&self) -> TrailsResult<Registration> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(TrailsError::missing_field("username"));
        }
        let email = self.email.trim().to_lowercase();
        if email.is_empty() {
            return Err(TrailsError::missing_field("email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(TrailsError::validation_with_suggestion(
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
                "Choose a longer password",
            ));
        }
        Ok(Registration::new(username, email, self.password.clone()))
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Bearer-token context for one logged-in user.
pub struct AuthSession {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    user: Option<User>,
}

impl AuthSession {
    /// Create a session from a login response.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>, user: Option<User>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            refresh_token: refresh_token.map(SecretString::new),
            user,
        }
    }

    /// Wrap a token obtained elsewhere.
    pub fn from_token(token: impl Into<String>) -> TrailsResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(TrailsError::Authentication {
                message: "Access token is empty".to_string(),
                code: ErrorCode::AuthMissingCredentials,
                source: None,
            });
        }
        Ok(Self::new(token.trim(), None, None))
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Attach the profile fetched after a token-only login.
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// End the session; the tokens are zeroized on drop.
    pub fn logout(self) {
        tracing::info!(
            user = self.user.as_ref().map(|u| u.username.as_str()).unwrap_or("<token>"),
            "Session closed"
        );
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}
