//! Session persistence.
//!
//! The store writes the client's exported session to a single JSON file
//! and reads it back verbatim. The stored state is never validated at
//! rest; a file that parses is assumed good until a remote call proves
//! otherwise.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::api::SessionState;

/// Environment override for the session file location.
pub const SESSION_FILE_ENV: &str = "GRAMLINE_SESSION_FILE";

/// Default session file name under the home directory.
const SESSION_FILE: &str = ".gramline_session.json";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to access session file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid session payload: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("could not determine home directory")]
    NoHomeDir,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Resolve the session path from the environment override, falling
    /// back to a dotfile in the home directory.
    pub fn from_env() -> Result<Self, SessionError> {
        if let Ok(path) = std::env::var(SESSION_FILE_ENV) {
            return Ok(Self::new(PathBuf::from(path)));
        }
        let home = dirs::home_dir().ok_or(SessionError::NoHomeDir)?;
        Ok(Self::new(home.join(SESSION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<SessionState, SessionError> {
        let contents = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&contents).map_err(SessionError::Corrupt)
    }

    /// Write the session, then restrict the file to owner read/write.
    pub fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(state).map_err(SessionError::Corrupt)?;
        std::fs::write(&self.path, contents)?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Remove the session file. Returns false when there was none.
    pub fn delete(&self) -> Result<bool, SessionError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn restrict_permissions(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
