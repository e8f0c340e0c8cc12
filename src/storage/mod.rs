pub mod db;
pub mod export;
pub mod models;

pub use db::UserStore;
pub use export::{export_users, write_users_csv};
pub use models::{UserAccount, UserStats, UserStatus};
