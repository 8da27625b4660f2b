use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown notification reason: {0}")]
    UnknownReason(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Invalid alarm rule: {0}")]
    InvalidRule(String),
}
