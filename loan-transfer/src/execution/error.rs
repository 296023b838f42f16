use thiserror::Error;

use crate::{
    journal_entry::error::JournalEntryError,
    loan::LoanLookupError,
    outbox::error::OutboxError,
    primitives::*,
    transfer::{error::TransferError, TransferStatus},
};

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("ExecutionError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("ExecutionError - TransferError: {0}")]
    TransferError(#[from] TransferError),
    #[error("ExecutionError - JournalEntryError: {0}")]
    JournalEntryError(#[from] JournalEntryError),
    #[error("ExecutionError - OutboxError: {0}")]
    OutboxError(#[from] OutboxError),
    #[error("ExecutionError - LoanLookup: {0}")]
    LoanLookup(#[from] LoanLookupError),
    #[error("ExecutionError - IllegalTransferCombination: Illegal transfer found. Expected PENDING and BUYBACK, found: {first} and {second}")]
    IllegalTransferCombination {
        loan_id: LoanId,
        first: TransferStatus,
        second: TransferStatus,
    },
    #[error("ExecutionError - ActiveTransferNotFound: no open ACTIVE transfer of owner {owner_id} for loan {loan_id}")]
    ActiveTransferNotFound { loan_id: LoanId, owner_id: OwnerId },
}

impl ExecutionError {
    /// Violations of the transfer log's invariants, as opposed to failures
    /// of the underlying store.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::IllegalTransferCombination { .. }
                | Self::ActiveTransferNotFound { .. }
                | Self::TransferError(TransferError::TooManyEffectiveTransfers { .. })
        )
    }
}
