mod entity;
pub mod error;
mod loan_mapping;
mod repo;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::instrument;

use crate::{
    primitives::*,
    query::{Page, PagingArgs},
    AtomicOperation,
};

pub use entity::*;
use error::*;
use loan_mapping::*;
use repo::*;

/// Selects transfers by exactly one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferFilter {
    LoanId(LoanId),
    ExternalLoanId(String),
    ExternalId(String),
}

#[derive(Clone)]
pub struct Transfers {
    repo: TransferRepo,
    loan_mappings: OwnerLoanMappingRepo,
}

impl Transfers {
    pub fn new(pool: &SqlitePool) -> Self {
        Self {
            repo: TransferRepo::new(pool),
            loan_mappings: OwnerLoanMappingRepo,
        }
    }

    #[instrument(name = "loan_transfer.transfers.find_by_id", skip(self), err)]
    pub async fn find_by_id(&self, id: TransferId) -> Result<Transfer, TransferError> {
        self.repo.find_by_id(self.repo.pool(), id).await
    }

    #[instrument(name = "loan_transfer.transfers.list", skip(self), err)]
    pub async fn list(
        &self,
        filter: TransferFilter,
        paging: PagingArgs,
    ) -> Result<Page<Transfer>, TransferError> {
        self.repo.list(&filter, paging).await
    }

    #[instrument(name = "loan_transfer.transfers.effective_for_loan", skip(self), err)]
    pub async fn effective_for_loan(
        &self,
        loan_id: LoanId,
    ) -> Result<EffectiveTransfers, TransferError> {
        let transfers = self
            .repo
            .find_open_for_loan(self.repo.pool(), loan_id, &TransferStatus::EFFECTIVE, None)
            .await?;
        EffectiveTransfers::try_new(loan_id, transfers)
    }

    /// The ACTIVE transfer through which the loan is currently owned, if any.
    #[instrument(name = "loan_transfer.transfers.find_active_owner_transfer", skip(self), err)]
    pub async fn find_active_owner_transfer(
        &self,
        loan_id: LoanId,
    ) -> Result<Option<Transfer>, TransferError> {
        match self
            .loan_mappings
            .find_by_loan(self.repo.pool(), loan_id)
            .await?
        {
            Some((transfer_id, _)) => Ok(Some(self.find_by_id(transfer_id).await?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn find_latest_open_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Transfer>, TransferError> {
        self.repo
            .find_latest_open_by_external_id(self.repo.pool(), external_id)
            .await
    }

    pub(crate) async fn find_by_id_in_op(
        &self,
        op: &mut AtomicOperation,
        id: TransferId,
    ) -> Result<Transfer, TransferError> {
        self.repo.find_by_id(&mut **op.tx(), id).await
    }

    pub(crate) async fn external_id_exists_in_op(
        &self,
        op: &mut AtomicOperation,
        external_id: &str,
    ) -> Result<bool, TransferError> {
        self.repo
            .external_id_exists(&mut **op.tx(), external_id)
            .await
    }

    pub(crate) async fn effective_for_loan_in_op(
        &self,
        op: &mut AtomicOperation,
        loan_id: LoanId,
    ) -> Result<EffectiveTransfers, TransferError> {
        self.open_for_loan_in_op(op, loan_id, &TransferStatus::EFFECTIVE, None)
            .await
    }

    /// Open PENDING and BUYBACK rows of the loan.
    pub(crate) async fn open_intents_for_loan_in_op(
        &self,
        op: &mut AtomicOperation,
        loan_id: LoanId,
    ) -> Result<EffectiveTransfers, TransferError> {
        self.open_for_loan_in_op(op, loan_id, &TransferStatus::INTENTS, None)
            .await
    }

    /// Open PENDING and BUYBACK rows of the loan settling on `date`.
    pub(crate) async fn due_for_settlement_in_op(
        &self,
        op: &mut AtomicOperation,
        loan_id: LoanId,
        date: NaiveDate,
    ) -> Result<EffectiveTransfers, TransferError> {
        self.open_for_loan_in_op(op, loan_id, &TransferStatus::INTENTS, Some(date))
            .await
    }

    async fn open_for_loan_in_op(
        &self,
        op: &mut AtomicOperation,
        loan_id: LoanId,
        statuses: &[TransferStatus],
        settlement_date: Option<NaiveDate>,
    ) -> Result<EffectiveTransfers, TransferError> {
        let transfers = self
            .repo
            .find_open_for_loan(&mut **op.tx(), loan_id, statuses, settlement_date)
            .await?;
        EffectiveTransfers::try_new(loan_id, transfers)
    }

    pub(crate) async fn find_open_active_for_owner_in_op(
        &self,
        op: &mut AtomicOperation,
        loan_id: LoanId,
        owner_id: OwnerId,
    ) -> Result<Option<Transfer>, TransferError> {
        self.repo
            .find_open_active_for_owner(&mut **op.tx(), loan_id, owner_id)
            .await
    }

    pub(crate) async fn create_in_op(
        &self,
        op: &mut AtomicOperation,
        new_transfer: NewTransfer,
    ) -> Result<Transfer, TransferError> {
        self.repo.create_in_tx(op.tx(), new_transfer).await
    }

    /// Ends the transfer's validity on the operation's business date.
    pub(crate) async fn close_in_op(
        &self,
        op: &mut AtomicOperation,
        transfer: &mut Transfer,
        details: Option<NewTransferDetails>,
    ) -> Result<(), TransferError> {
        let on = op.business_date();
        self.repo.close_in_tx(op.tx(), transfer, on, details).await
    }

    /// Closes `transfer` and records `successor` in its place.
    pub(crate) async fn supersede_in_op(
        &self,
        op: &mut AtomicOperation,
        transfer: &mut Transfer,
        successor: NewTransfer,
    ) -> Result<Transfer, TransferError> {
        self.close_in_op(op, transfer, None).await?;
        self.create_in_op(op, successor).await
    }

    pub(crate) async fn map_loan_to_owner_in_op(
        &self,
        op: &mut AtomicOperation,
        active: &Transfer,
    ) -> Result<(), TransferError> {
        self.loan_mappings
            .create_in_tx(op.tx(), active.loan_id(), active.id())
            .await
    }

    pub(crate) async fn unmap_loan_in_op(
        &self,
        op: &mut AtomicOperation,
        loan_id: LoanId,
        active_id: TransferId,
    ) -> Result<bool, TransferError> {
        self.loan_mappings
            .delete_in_tx(op.tx(), loan_id, active_id)
            .await
    }

    pub(crate) async fn find_owner_of_loan_in_op(
        &self,
        op: &mut AtomicOperation,
        loan_id: LoanId,
    ) -> Result<Option<OwnerId>, TransferError> {
        Ok(self
            .loan_mappings
            .find_by_loan(&mut **op.tx(), loan_id)
            .await?
            .map(|(_, owner_id)| owner_id))
    }
}
