use std::io::Write;
use std::path::Path;

use crate::{error::Result, storage::models::UserAccount};

/// Write `username,password_hash,active` rows, header first
pub fn write_users_csv<W: Write>(users: &[UserAccount], out: W) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["username", "password_hash", "active"])?;
    for user in users {
        writer.write_record([
            user.username.as_str(),
            user.password_hash.as_str(),
            if user.active { "True" } else { "False" },
        ])?;
    }
    writer.flush()?;
    Ok(users.len())
}

pub fn export_users(users: &[UserAccount], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    write_users_csv(users, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_users_csv() {
        let mut alice = UserAccount::new("alice", "abc".to_string());
        alice.active = true;
        let bob = UserAccount::new("bob", "def".to_string());

        let mut buf = Vec::new();
        let written = write_users_csv(&[alice, bob], &mut buf).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "username,password_hash,active\nalice,abc,True\nbob,def,False\n"
        );
    }
}
