//! trails-client - HTTP client for the Brain-Trails study API.
//!
//! [`ApiClient`] implements the `DeckStore` and `ReviewScheduler` traits of
//! `trails-core` over `reqwest`; [`AuthClient`] performs the login exchange
//! that produces the [`AuthSession`] it needs.
//!
//! # Example
//!
//! ```ignore
//! use trails_client::{ApiClient, AuthClient};
//! use trails_core::{ClientConfig, Credentials, DeckManager};
//!
//! let config = ClientConfig::from_env();
//! let session = AuthClient::new(&config)?
//!     .login(&Credentials::new("ada", "correct horse"))
//!     .await?;
//!
//! let api = std::sync::Arc::new(ApiClient::new(&config, session)?);
//! let manager = DeckManager::new(api.clone(), api);
//! manager.refresh().await?;
//! ```

mod auth;
mod client;
mod transport;

pub use auth::AuthClient;
pub use client::ApiClient;
pub use trails_core::types::AuthSession;
