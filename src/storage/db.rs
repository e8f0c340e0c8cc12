use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::{
    access::{hash_password, IdentityProvider},
    error::{Result, SelectError},
    storage::models::{UserAccount, UserStats, UserStatus},
};

const USER_COLUMNS: &str = "username, password_hash, active, created_at";

/// SQLite-backed user store
pub struct UserStore {
    conn: Connection,
}

impl UserStore {
    pub fn new(path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                username TEXT PRIMARY KEY,
                password_hash TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_users_active ON users(active)",
            [],
        )?;

        Ok(())
    }

    pub fn insert_user(&self, account: &UserAccount) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (username, password_hash, active, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                account.username,
                account.password_hash,
                account.active,
                account.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, username: &str) -> Result<Option<UserAccount>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                [username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_stats(&self) -> Result<UserStats> {
        let total_users: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;

        let active_users: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE active = 1",
            [],
            |row| row.get(0),
        )?;

        Ok(UserStats {
            total_users: total_users as usize,
            active_users: active_users as usize,
            inactive_users: (total_users - active_users) as usize,
        })
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<UserAccount> {
    let created_at: String = row.get(3)?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&chrono::Utc);

    Ok(UserAccount {
        username: row.get(0)?,
        password_hash: row.get(1)?,
        active: row.get(2)?,
        created_at,
    })
}

impl IdentityProvider for UserStore {
    fn register(&self, username: &str, password: &str) -> Result<UserAccount> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SelectError::InvalidInput("username must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(SelectError::InvalidInput("password must not be empty".to_string()));
        }
        if self.get_user(username)?.is_some() {
            return Err(SelectError::UsernameTaken(username.to_string()));
        }

        let account = UserAccount::new(username, hash_password(password));
        self.insert_user(&account)?;
        info!("Registered user {} (inactive)", username);
        Ok(account)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<UserAccount> {
        let username = username.trim();
        let account = self
            .get_user(username)?
            .ok_or_else(|| SelectError::UserNotFound(username.to_string()))?;

        if account.password_hash != hash_password(password) {
            debug!("Password mismatch for {}", username);
            return Err(SelectError::IncorrectPassword);
        }
        if !account.active {
            return Err(SelectError::AccountInactive(username.to_string()));
        }
        Ok(account)
    }

    fn set_active(&self, username: &str, active: bool) -> Result<()> {
        let username = username.trim();
        let updated = self.conn.execute(
            "UPDATE users SET active = ?1 WHERE username = ?2",
            params![active, username],
        )?;
        if updated == 0 {
            return Err(SelectError::UserNotFound(username.to_string()));
        }
        info!(
            "User {} {}",
            username,
            if active { "activated" } else { "deactivated" }
        );
        Ok(())
    }

    fn list_users(&self, status: UserStatus) -> Result<Vec<UserAccount>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users.into_iter().filter(|u| status.includes(u)).collect())
    }

    fn find_user(&self, username: &str) -> Result<Option<UserAccount>> {
        self.get_user(username.trim())
    }
}
