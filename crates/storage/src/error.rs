use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("account collision: {email}")]
    AccountCollision { email: String },

    #[error("core error: {0}")]
    Core(#[from] vistoria_core::CoreError),
}
