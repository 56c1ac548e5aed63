//! Remote API surface.
//!
//! `RemoteClient` is the capability every account operation is built on;
//! `ApiClient` is the concrete HTTP implementation. The authenticator and
//! gateway are written against the trait so they can be exercised with
//! scripted clients in tests.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod mock;

pub use client::ApiClient;
pub use error::ClientError;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FeedEntry, UserProfile, UserSummary};

/// Serialized client state persisted between invocations.
///
/// Treated as an opaque snapshot by everything except the client itself:
/// the session store writes and reads it verbatim and never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub device_id: String,
    pub session_token: String,
    pub csrf_token: String,
    pub user_id: u64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait RemoteClient: Send {
    /// Authenticate with credentials. When a restored session is present
    /// the server revalidates it instead of minting a fresh one.
    async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError>;

    /// Hydrate this client from a previously exported session.
    fn restore_session(&mut self, state: SessionState);

    /// Export the current session for persistence.
    fn export_session(&self) -> Result<SessionState, ClientError>;

    /// Numeric id of the authenticated user, if a session is present.
    fn user_id(&self) -> Option<u64>;

    /// Profile of the authenticated account. Doubles as the session
    /// validity probe.
    async fn current_account(&self) -> Result<UserProfile, ClientError>;

    async fn user_id_from_username(&self, username: &str) -> Result<u64, ClientError>;

    async fn user_info(&self, user_id: u64) -> Result<UserProfile, ClientError>;

    async fn search_users(&self, query: &str) -> Result<Vec<UserSummary>, ClientError>;

    /// One page of the timeline, ads and non-media units included.
    async fn timeline_feed(&self) -> Result<Vec<FeedEntry>, ClientError>;

    /// Upload a photo and publish it with the given caption. Returns the
    /// media identifier of the new post.
    async fn upload_photo(&self, path: &Path, caption: &str) -> Result<String, ClientError>;
}
