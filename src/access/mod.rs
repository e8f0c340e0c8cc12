pub mod provider;
pub mod session;

use sha2::{Digest, Sha256};

pub use provider::IdentityProvider;
#[cfg(test)]
pub use provider::MockIdentityProvider;
pub use session::{AccessGate, Role, Session, SessionStore};

/// Hex-encoded SHA-256 of the password
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
