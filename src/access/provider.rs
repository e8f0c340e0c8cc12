use crate::{
    error::Result,
    storage::models::{UserAccount, UserStatus},
};

/// Who may use the lookup tool.
///
/// `authenticate` checks, in order: the user exists, the password matches,
/// the account is active.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityProvider {
    fn register(&self, username: &str, password: &str) -> Result<UserAccount>;

    fn authenticate(&self, username: &str, password: &str) -> Result<UserAccount>;

    fn set_active(&self, username: &str, active: bool) -> Result<()>;

    fn list_users(&self, status: UserStatus) -> Result<Vec<UserAccount>>;

    fn find_user(&self, username: &str) -> Result<Option<UserAccount>>;
}
