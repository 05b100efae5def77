//! Client SDK for the miniapps user profile API.
//!
//! [`Client`] owns a bearer token and a base endpoint, performs exactly one
//! authenticated HTTPS GET per call, and normalizes transport, HTTP, and
//! application failures into [`FetchError`]. Construction is the only
//! operation that fails eagerly; every call-time failure is returned as a
//! value.
//!
//! ```no_run
//! use miniapps_user_client::{Client, ClientConfig, RequestOptions};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::new("app-token"))?;
//! let response = client
//!     .fetch_user_profile("user-123", RequestOptions::default())
//!     .await?;
//! println!("{}", response.profile.id);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod profile;

pub use client::{
    Client, ProfileFetcher, ProfileResponse, RequestOptions, DEFAULT_TIMEOUT,
};
pub use config::{ClientConfig, DEFAULT_ENDPOINT, ENDPOINT_ENV_VAR};
pub use error::{ConfigError, FetchError};
pub use profile::{ApiEnvelope, UserProfile};
