//! Login orchestration and session lifecycle.
//!
//! The authenticator produces a validated client handle from one of three
//! starting states: no session, a stale session, or a live session. The
//! handle lives for one invocation; only the session file survives the
//! process.

pub mod session;

use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ClientError, RemoteClient};
use session::{SessionError, SessionStore};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("not authenticated - please login first")]
    NotAuthenticated,

    #[error("session expired - please login again")]
    SessionExpired,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Orchestrates login, logout, and session validation.
///
/// Holds the session store and a client factory; every client it hands
/// out is constructed fresh for the current invocation.
pub struct Authenticator<C, F>
where
    C: RemoteClient,
    F: Fn() -> Result<C, ClientError>,
{
    store: SessionStore,
    new_client: F,
}

impl<C, F> Authenticator<C, F>
where
    C: RemoteClient,
    F: Fn() -> Result<C, ClientError>,
{
    pub fn new(store: SessionStore, new_client: F) -> Self {
        Self { store, new_client }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Whether a stored session exists and the server still accepts it.
    ///
    /// The stored state is never trusted on its own, so this performs a
    /// real remote round-trip: it is not cheap and not free of
    /// server-side effects. Any failure, local or remote, reads as
    /// "not authenticated".
    pub async fn is_authenticated(&self) -> bool {
        let state = match self.store.load() {
            Ok(state) => state,
            Err(_) => return false,
        };
        let mut client = match (self.new_client)() {
            Ok(client) => client,
            Err(_) => return false,
        };
        client.restore_session(state);
        client.current_account().await.is_ok()
    }

    /// Login with credentials, reusing the stored session when possible.
    ///
    /// A stored session is revalidated by logging in on top of it; on any
    /// failure the file is left in place and the fresh path decides
    /// whether it gets overwritten.
    pub async fn login(&self, username: &str, password: &str) -> Result<C, AuthError> {
        if self.store.exists() {
            match self.try_session_login(username, password).await {
                Ok(client) => {
                    info!(username, "logged in with existing session");
                    return Ok(client);
                }
                Err(err) => {
                    debug!(error = %err, "existing session rejected, performing fresh login");
                }
            }
        }

        let mut client = (self.new_client)()?;
        client.login(username, password).await?;
        let state = client.export_session()?;
        self.store.save(&state)?;
        info!(username, "logged in with fresh session");
        Ok(client)
    }

    async fn try_session_login(&self, username: &str, password: &str) -> Result<C, AuthError> {
        let state = self.store.load()?;
        let mut client = (self.new_client)()?;
        client.restore_session(state);
        client.login(username, password).await?;
        Ok(client)
    }

    /// Remove the stored session. Returns false when no session existed.
    pub fn logout(&self) -> Result<bool, AuthError> {
        Ok(self.store.delete()?)
    }

    /// Produce a validated handle for one invocation.
    ///
    /// Fails with `NotAuthenticated` when there is no usable session, and
    /// with `SessionExpired` when the stored session loads but the server
    /// no longer accepts it mid-flight. Expiry is never papered over with
    /// a silent re-login; the caller is told to login again.
    pub async fn handle(&self) -> Result<C, AuthError> {
        if !self.is_authenticated().await {
            return Err(AuthError::NotAuthenticated);
        }

        let state = self.store.load()?;
        let mut client = (self.new_client)()?;
        client.restore_session(state);

        // One liveness check against the feed before handing the client out.
        match client.timeline_feed().await {
            Ok(_) => Ok(client),
            Err(ClientError::AuthExpired) => Err(AuthError::SessionExpired),
            Err(err) => Err(err.into()),
        }
    }

    /// Username of the authenticated account, for best-effort display.
    /// This is the one call that absorbs all failures into `None`.
    pub async fn current_username(&self) -> Option<String> {
        let client = self.handle().await.ok()?;
        let user_id = client.user_id()?;
        let profile = client.user_info(user_id).await.ok()?;
        Some(profile.username)
    }
}
