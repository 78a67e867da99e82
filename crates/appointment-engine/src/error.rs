//! Error types for appointment-engine operations.
//!
//! These are faults. Policy violations and conflicts are reported as values
//! (see [`crate::policy::ValidationResult`] and [`crate::session::Rejection`]).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure reported by an [`crate::repository::AppointmentRepository`].
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("appointment {0} not found")]
    NotFound(i64),

    #[error("appointment {0} already exists")]
    AlreadyExists(i64),
}

pub type Result<T> = std::result::Result<T, EngineError>;
