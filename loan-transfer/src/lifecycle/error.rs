use chrono::NaiveDate;
use thiserror::Error;

use crate::{
    loan::{LoanLookupError, LoanStatus},
    outbox::error::OutboxError,
    owner::error::OwnerError,
    primitives::*,
    request::ValidationErrors,
    transfer::{error::TransferError, TransferStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    StateConflict,
    TemporalValidation,
    DuplicateCorrelation,
    Validation,
    Internal,
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("LifecycleError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("LifecycleError - TransferError: {0}")]
    TransferError(#[from] TransferError),
    #[error("LifecycleError - OwnerError: {0}")]
    OwnerError(#[from] OwnerError),
    #[error("LifecycleError - OutboxError: {0}")]
    OutboxError(#[from] OutboxError),
    #[error("LifecycleError - LoanLookup: {0}")]
    LoanLookup(#[from] LoanLookupError),
    #[error("LifecycleError - Validation: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Loan with identifier {0} does not exist")]
    LoanNotFound(LoanId),
    #[error("Loan is not in active status")]
    LoanNotEligible { loan_id: LoanId, status: LoanStatus },
    #[error("External asset owner transfer with identifier {0} does not exist")]
    TransferNotFound(TransferId),
    #[error("External asset owner transfer with external identifier {0} does not exist")]
    TransferNotFoundByExternalId(String),
    #[error("Settlement date cannot be in the past")]
    SettlementDateInPast,
    #[error("This loan cannot be bought back, settlement date is earlier than effective transfer settlement date: {0}")]
    SettlementDateTooEarly(NaiveDate),
    #[error("Already existing an asset transfer with the provided transfer external id: {0}")]
    DuplicateTransferId(String),
    #[error("This loan cannot be sold, there is already an in progress transfer")]
    TransferAlreadyInProgress,
    #[error("External asset owner transfer is already in PENDING state for this loan")]
    AlreadyPendingSale,
    #[error("This loan cannot be sold, because it is owned by an external asset owner")]
    AlreadyOwnedExternally,
    #[error("This loan cannot be sold, the effective transfer is in {0} state")]
    InvalidTransferState(TransferStatus),
    #[error("This loan cannot be bought back, it is not owned by an external asset owner")]
    NotExternallyOwned,
    #[error("This loan cannot be bought back, external asset owner buyback transfer is already in progress")]
    BuybackAlreadyInProgress,
    #[error("This loan cannot be bought back, the effective transfer is in {0} state")]
    WrongTransferState(TransferStatus),
    #[error("Only the latest transfer of a loan can be cancelled, {0} is not the latest")]
    NotLatestTransfer(TransferId),
    #[error("External asset owner transfer {id} cannot be cancelled in {status} state")]
    NotCancellable {
        id: TransferId,
        status: TransferStatus,
    },
}

impl LifecycleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LoanNotFound(_)
            | Self::TransferNotFound(_)
            | Self::TransferNotFoundByExternalId(_) => ErrorKind::NotFound,
            Self::LoanNotEligible { .. }
            | Self::TransferAlreadyInProgress
            | Self::AlreadyPendingSale
            | Self::AlreadyOwnedExternally
            | Self::InvalidTransferState(_)
            | Self::NotExternallyOwned
            | Self::BuybackAlreadyInProgress
            | Self::WrongTransferState(_)
            | Self::NotLatestTransfer(_)
            | Self::NotCancellable { .. } => ErrorKind::StateConflict,
            Self::SettlementDateInPast | Self::SettlementDateTooEarly(_) => {
                ErrorKind::TemporalValidation
            }
            Self::DuplicateTransferId(_) => ErrorKind::DuplicateCorrelation,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Sqlx(_)
            | Self::TransferError(_)
            | Self::OwnerError(_)
            | Self::OutboxError(_)
            | Self::LoanLookup(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert_eq!(
            LifecycleError::LoanNotFound(LoanId::new(1)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LifecycleError::AlreadyPendingSale.kind(),
            ErrorKind::StateConflict
        );
        assert_eq!(
            LifecycleError::SettlementDateInPast.kind(),
            ErrorKind::TemporalValidation
        );
        assert_eq!(
            LifecycleError::DuplicateTransferId("x".to_string()).kind(),
            ErrorKind::DuplicateCorrelation
        );
    }

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            LifecycleError::LoanNotFound(LoanId::new(12)).to_string(),
            "Loan with identifier 12 does not exist"
        );
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            LifecycleError::SettlementDateTooEarly(date).to_string(),
            "This loan cannot be bought back, settlement date is earlier than effective transfer settlement date: 2024-03-05"
        );
    }
}
