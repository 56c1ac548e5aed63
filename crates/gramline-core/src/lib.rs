//! Core library for gramline.
//!
//! This crate holds everything below the terminal surface:
//! - `auth`: session persistence and the login/logout/validation flow
//! - `api`: the remote capability trait and the concrete HTTP client
//! - `gateway`: account operations wrapped in rate-limit retry
//! - `models`: domain types shared across the crate
//! - `config`: the small on-disk application config
//!
//! Nothing in here prints to the terminal; observability goes through
//! `tracing` and presentation lives entirely in the CLI crate.

pub mod api;
pub mod auth;
pub mod config;
pub mod gateway;
pub mod models;

pub use api::{ApiClient, ClientError, RemoteClient, SessionState};
pub use auth::session::{SessionError, SessionStore};
pub use auth::{AuthError, Authenticator};
pub use gateway::{Gateway, GatewayError, RetryPolicy};
