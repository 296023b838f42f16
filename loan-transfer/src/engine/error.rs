use thiserror::Error;

use crate::{
    execution::error::ExecutionError, journal_entry::error::JournalEntryError,
    lifecycle::error::LifecycleError, outbox::error::OutboxError, owner::error::OwnerError,
    request::ValidationErrors, transfer::error::TransferError,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("EngineError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("EngineError - Migrate: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
    #[error("EngineError - Config: {0}")]
    ConfigError(String),
    #[error("EngineError - Validation: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("EngineError - Outbox: {0}")]
    Outbox(#[from] OutboxError),
    #[error("EngineError - TransferError: {0}")]
    TransferError(#[from] TransferError),
    #[error("EngineError - OwnerError: {0}")]
    OwnerError(#[from] OwnerError),
    #[error("EngineError - JournalEntryError: {0}")]
    JournalEntryError(#[from] JournalEntryError),
    #[error("EngineError - LifecycleError: {0}")]
    LifecycleError(#[from] LifecycleError),
    #[error("EngineError - ExecutionError: {0}")]
    ExecutionError(#[from] ExecutionError),
}
