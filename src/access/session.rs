use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    access::{hash_password, IdentityProvider},
    config::AdminConfig,
    error::{Result, SelectError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Role {
    User { username: String },
    Admin { username: String },
}

/// Who is logged in, and since when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub role: Role,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn user(username: &str) -> Self {
        Self {
            role: Role::User {
                username: username.to_string(),
            },
            started_at: Utc::now(),
        }
    }

    pub fn admin(username: &str) -> Self {
        Self {
            role: Role::Admin {
                username: username.to_string(),
            },
            started_at: Utc::now(),
        }
    }

    pub fn username(&self) -> &str {
        match &self.role {
            Role::User { username } | Role::Admin { username } => username,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin { .. })
    }
}

/// JSON file holding the current session between invocations
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let body = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&body) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        debug!("Session for {} saved to {}", session.username(), self.path.display());
        Ok(())
    }

    /// Remove the session file. Returns false if nobody was logged in.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Login and permission checks in front of the lookup tool
pub struct AccessGate<P> {
    provider: P,
    admin: AdminConfig,
}

impl<P: IdentityProvider> AccessGate<P> {
    pub fn new(provider: P, admin: AdminConfig) -> Self {
        Self { provider, admin }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let account = self.provider.authenticate(username, password)?;
        info!("User {} logged in", account.username);
        Ok(Session::user(&account.username))
    }

    pub fn admin_login(&self, username: &str, password: &str) -> Result<Session> {
        if username.trim() != self.admin.username || hash_password(password) != self.admin.password_hash {
            warn!("Rejected admin login for {}", username);
            return Err(SelectError::InvalidAdminCredentials);
        }
        info!("Admin {} logged in", self.admin.username);
        Ok(Session::admin(&self.admin.username))
    }

    /// Lookups need an admin session or a user whose account is still active.
    pub fn require_lookup<'s>(&self, session: Option<&'s Session>) -> Result<&'s Session> {
        let session = session.ok_or(SelectError::NotAuthenticated)?;
        match &session.role {
            Role::User { username } => {
                let account = self
                    .provider
                    .find_user(username)?
                    .ok_or_else(|| SelectError::UserNotFound(username.clone()))?;
                if !account.active {
                    return Err(SelectError::AccountInactive(username.clone()));
                }
            }
            Role::Admin { username } if *username != self.admin.username => {
                warn!("Stale admin session for {}", username);
                return Err(SelectError::NotAuthenticated);
            }
            Role::Admin { .. } => {}
        }
        Ok(session)
    }

    pub fn require_admin<'s>(&self, session: Option<&'s Session>) -> Result<&'s Session> {
        let session = session.ok_or(SelectError::NotAuthenticated)?;
        if session.is_admin() && session.username() == self.admin.username {
            Ok(session)
        } else {
            Err(SelectError::Forbidden)
        }
    }
}
