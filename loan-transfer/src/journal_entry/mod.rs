mod entity;
pub mod error;
mod generator;
mod repo;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::instrument;

use std::sync::Arc;

use crate::{
    accounts::AccountResolver,
    loan::LoanValues,
    primitives::*,
    query::{Page, PagingArgs},
    transfer::{Transfer, TransferValues, Transfers},
    AtomicOperation,
};

pub use entity::*;
use error::*;
pub use generator::transfer_transaction_id;
use repo::*;

/// Writes the ledger postings that accompany executed transfers.
#[derive(Clone)]
pub struct JournalEntries {
    repo: JournalEntryRepo,
    transfers: Transfers,
    resolver: Arc<dyn AccountResolver>,
}

impl JournalEntries {
    pub(crate) fn new(
        pool: &SqlitePool,
        transfers: &Transfers,
        resolver: Arc<dyn AccountResolver>,
    ) -> Self {
        Self {
            repo: JournalEntryRepo::new(pool),
            transfers: transfers.clone(),
            resolver,
        }
    }

    /// Computes, without persisting, the postings for moving the loan's
    /// outstanding balances into (or with `reversed` out of) the clearing
    /// account.
    pub fn generate_transfer_entries(
        &self,
        loan: &LoanValues,
        transfer: &TransferValues,
        reversed: bool,
        date: NaiveDate,
    ) -> Result<Vec<NewJournalEntry>, JournalEntryError> {
        Ok(generator::transfer_entries(
            self.resolver.as_ref(),
            loan,
            transfer,
            reversed,
            date,
        )?)
    }

    #[instrument(name = "loan_transfer.journal_entries.list_for_transfer", skip(self), err)]
    pub async fn list_for_transfer(
        &self,
        transfer_id: TransferId,
        paging: PagingArgs,
    ) -> Result<Page<JournalEntryValues>, JournalEntryError> {
        self.repo.list_for_transfer(transfer_id, paging).await
    }

    #[instrument(name = "loan_transfer.journal_entries.list_for_owner", skip(self), err)]
    pub async fn list_for_owner(
        &self,
        owner_id: OwnerId,
        paging: PagingArgs,
    ) -> Result<Page<JournalEntryValues>, JournalEntryError> {
        self.repo.list_for_owner(owner_id, paging).await
    }

    /// Posts a sale: the balances leave the institution's accounts through
    /// the clearing account and the owner is linked to the debit side.
    pub(crate) async fn post_sale_in_op(
        &self,
        op: &mut AtomicOperation,
        loan: &LoanValues,
        transfer: &Transfer,
    ) -> Result<Vec<JournalEntryValues>, JournalEntryError> {
        self.post_in_op(op, loan, transfer, [false, true], DebitOrCredit::Debit)
            .await
    }

    /// Posts a buyback, mirroring the sale legs. Overpaid loans link the
    /// owner to the debit side, all others to the credit side.
    pub(crate) async fn post_buyback_in_op(
        &self,
        op: &mut AtomicOperation,
        loan: &LoanValues,
        transfer: &Transfer,
    ) -> Result<Vec<JournalEntryValues>, JournalEntryError> {
        let owner_side = if loan.is_overpaid() {
            DebitOrCredit::Debit
        } else {
            DebitOrCredit::Credit
        };
        self.post_in_op(op, loan, transfer, [true, false], owner_side)
            .await
    }

    async fn post_in_op(
        &self,
        op: &mut AtomicOperation,
        loan: &LoanValues,
        transfer: &Transfer,
        legs: [bool; 2],
        owner_side: DebitOrCredit,
    ) -> Result<Vec<JournalEntryValues>, JournalEntryError> {
        let date = op.business_date();
        let mut new_entries = Vec::new();
        for reversed in legs {
            new_entries.extend(self.generate_transfer_entries(
                loan,
                transfer.values(),
                reversed,
                date,
            )?);
        }
        if new_entries.is_empty() {
            return Ok(Vec::new());
        }

        let clearing_account = self.resolver.clearing_account(loan)?;
        let mut entries = Vec::with_capacity(new_entries.len());
        for new_entry in new_entries {
            let entry = self.repo.create_in_tx(op.tx(), new_entry).await?;
            self.repo
                .map_to_transfer_in_tx(op.tx(), transfer.id(), entry.id)
                .await?;
            if entry.account_id != clearing_account && entry.direction == owner_side {
                self.repo
                    .map_to_owner_in_tx(op.tx(), transfer.owner_id(), entry.id)
                    .await?;
            }
            entries.push(entry);
        }
        tracing::debug!(
            transfer_id = %transfer.id(),
            count = entries.len(),
            "posted transfer journal entries"
        );
        Ok(entries)
    }

    /// Links a journal entry posted on an externally owned loan to the
    /// loan's current owner. Entries of loans without an owner are ignored.
    pub(crate) async fn record_loan_entry_in_op(
        &self,
        op: &mut AtomicOperation,
        entry: &JournalEntryValues,
    ) -> Result<Option<OwnerId>, JournalEntryError> {
        let loan_id = match entry.loan_id {
            Some(loan_id) => loan_id,
            None => return Ok(None),
        };
        let owner_id = match self.transfers.find_owner_of_loan_in_op(op, loan_id).await? {
            Some(owner_id) => owner_id,
            None => return Ok(None),
        };
        let (local_id, already_stored) = self.repo.import_in_tx(op.tx(), entry).await?;
        if already_stored {
            tracing::debug!(entry_id = %entry.id, %local_id, "loan journal entry already recorded");
        }
        self.repo
            .map_to_owner_in_tx(op.tx(), owner_id, local_id)
            .await?;
        Ok(Some(owner_id))
    }
}
