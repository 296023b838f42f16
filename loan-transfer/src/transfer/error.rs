use thiserror::Error;

use crate::primitives::*;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("TransferError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("TransferError - UninitializedField: {0}")]
    UninitializedField(#[from] derive_builder::UninitializedFieldError),
    #[error("TransferError - ParseCode: {0}")]
    ParseCode(#[from] strum::ParseError),
    #[error("TransferError - ParseDecimal: {0}")]
    ParseDecimal(#[from] rust_decimal::Error),
    #[error("TransferError - NotFound: {0}")]
    NotFound(TransferId),
    #[error("TransferError - AlreadyClosed: transfer {0} is no longer in force")]
    AlreadyClosed(TransferId),
    #[error("TransferError - ConcurrentModification: transfer {0} was closed concurrently")]
    ConcurrentModification(TransferId),
    #[error("TransferError - TooManyEffectiveTransfers: loan {loan_id} has {count} effective transfers")]
    TooManyEffectiveTransfers { loan_id: LoanId, count: usize },
}
