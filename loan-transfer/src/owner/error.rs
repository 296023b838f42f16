use thiserror::Error;

#[derive(Error, Debug)]
pub enum OwnerError {
    #[error("OwnerError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("OwnerError - CouldNotFindByExternalId: {0}")]
    CouldNotFindByExternalId(String),
}
