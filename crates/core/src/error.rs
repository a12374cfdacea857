use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid date key: {0}")]
    InvalidDateKey(String),

    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("system clock error: {0}")]
    Clock(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}
