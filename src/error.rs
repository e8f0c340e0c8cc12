use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("Dataset is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Data error: {0}")]
    Data(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Account {0} is not activated. Complete payment and contact the admin.")]
    AccountInactive(String),

    #[error("Invalid admin credentials")]
    InvalidAdminCredentials,

    #[error("Not logged in. Run `cet-select login` first.")]
    NotAuthenticated,

    #[error("Admin session required")]
    Forbidden,

    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SelectError {
    /// True for the errors that mean the dataset itself could not be served.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            SelectError::MissingColumns(_)
                | SelectError::Data(_)
                | SelectError::Csv(_)
                | SelectError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SelectError>;
