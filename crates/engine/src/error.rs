use vistoria_core::{CoreError, DateKey, RegistrationError};
use vistoria_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("registration refused: {0}")]
    Registration(#[from] RegistrationError),

    #[error("sign in to {0}")]
    Unauthenticated(&'static str),

    #[error("only the administrator may {0}")]
    Forbidden(&'static str),

    #[error("invalid e-mail or password")]
    InvalidCredentials,

    #[error("no date selected")]
    NoDateSelected,

    #[error("unknown equipment: {0}")]
    UnknownEquipment(String),

    #[error("a photo is required")]
    MissingPhoto,

    #[error("saving the checklist for {date} failed: {source}")]
    CommitFailed {
        date: DateKey,
        #[source]
        source: StorageError,
    },
}
