use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutboxError {
    #[error("OutboxError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("OutboxError - Serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
