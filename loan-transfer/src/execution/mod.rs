//! Resolution of open transfer intents: execution, declines and automatic
//! cancellations, triggered by settlement or by the loan closing.
pub mod error;
mod loan_closure;
mod settlement;

use chrono::Days;

use crate::{
    journal_entry::JournalEntries,
    loan::LoanValues,
    outbox::OutboxEventPayload,
    transfer::*,
    AtomicOperation,
};

use error::*;
pub use loan_closure::*;
pub use settlement::*;

/// Writes the terminal records of open intents and queues the events
/// announcing them on the operation.
#[derive(Clone)]
pub(crate) struct TransferExecutor {
    transfers: Transfers,
    journal_entries: JournalEntries,
}

impl TransferExecutor {
    pub(crate) fn new(transfers: &Transfers, journal_entries: &JournalEntries) -> Self {
        Self {
            transfers: transfers.clone(),
            journal_entries: journal_entries.clone(),
        }
    }

    /// Checks that two open intents are a sale followed by its buyback.
    pub(crate) fn sale_then_buyback(
        first: Transfer,
        second: Transfer,
    ) -> Result<(Transfer, Transfer), ExecutionError> {
        if first.status() == TransferStatus::Pending && second.status() == TransferStatus::Buyback
        {
            return Ok((first, second));
        }
        let err = ExecutionError::IllegalTransferCombination {
            loan_id: first.loan_id(),
            first: first.status(),
            second: second.status(),
        };
        tracing::error!(loan_id = %first.loan_id(), error = %err, "illegal open transfer combination");
        Err(err)
    }

    pub(crate) async fn decline_in_op(
        &self,
        op: &mut AtomicOperation,
        loan: &LoanValues,
        transfer: Transfer,
    ) -> Result<Transfer, ExecutionError> {
        let sub_status = if loan.is_overpaid() {
            TransferSubStatus::BalanceNegative
        } else {
            TransferSubStatus::BalanceZero
        };
        self.terminate_in_op(op, loan, transfer, TransferStatus::Declined, sub_status)
            .await
    }

    pub(crate) async fn cancel_in_op(
        &self,
        op: &mut AtomicOperation,
        loan: &LoanValues,
        transfer: Transfer,
        sub_status: TransferSubStatus,
    ) -> Result<Transfer, ExecutionError> {
        self.terminate_in_op(op, loan, transfer, TransferStatus::Cancelled, sub_status)
            .await
    }

    async fn terminate_in_op(
        &self,
        op: &mut AtomicOperation,
        loan: &LoanValues,
        mut transfer: Transfer,
        status: TransferStatus,
        sub_status: TransferSubStatus,
    ) -> Result<Transfer, ExecutionError> {
        let date = op.business_date();
        let successor = NewTransfer::successor_of(&transfer)
            .status(status)
            .sub_status(sub_status)
            .effective_date_from(date)
            .effective_date_to(date)
            .build()?;
        let terminal = self
            .transfers
            .supersede_in_op(op, &mut transfer, successor)
            .await?;
        tracing::info!(
            transfer_id = %transfer.id(),
            terminal_id = %terminal.id(),
            %status,
            %sub_status,
            "transfer intent terminated"
        );
        op.accumulate([ownership_transferred(&terminal, loan)]);
        Ok(terminal)
    }

    /// Turns a PENDING sale into the ACTIVE transfer that owns the loan from
    /// the next business day on.
    pub(crate) async fn execute_sale_in_op(
        &self,
        op: &mut AtomicOperation,
        loan: &LoanValues,
        mut pending: Transfer,
    ) -> Result<Transfer, ExecutionError> {
        let date = op.business_date();
        let active_from = date
            .checked_add_days(Days::new(1))
            .unwrap_or(date);
        let successor = NewTransfer::successor_of(&pending)
            .status(TransferStatus::Active)
            .effective_date_from(active_from)
            .details(NewTransferDetails::from(loan))
            .build()?;
        let active = self
            .transfers
            .supersede_in_op(op, &mut pending, successor)
            .await?;
        self.transfers.map_loan_to_owner_in_op(op, &active).await?;
        self.journal_entries
            .post_sale_in_op(op, loan, &active)
            .await?;

        tracing::info!(
            pending_id = %pending.id(),
            active_id = %active.id(),
            owner_id = %active.owner_id(),
            "sale executed"
        );
        op.accumulate([
            ownership_transferred(&active, loan),
            loan_account_snapshot(loan),
        ]);
        Ok(active)
    }

    /// Ends the owner's ACTIVE transfer and closes the BUYBACK row as the
    /// terminal record carrying the balance snapshot.
    pub(crate) async fn execute_buyback_in_op(
        &self,
        op: &mut AtomicOperation,
        loan: &LoanValues,
        mut buyback: Transfer,
    ) -> Result<Transfer, ExecutionError> {
        let mut active = self
            .transfers
            .find_open_active_for_owner_in_op(op, buyback.loan_id(), buyback.owner_id())
            .await?
            .ok_or_else(|| {
                let err = ExecutionError::ActiveTransferNotFound {
                    loan_id: buyback.loan_id(),
                    owner_id: buyback.owner_id(),
                };
                tracing::error!(
                    buyback_id = %buyback.id(),
                    error = %err,
                    "buyback without active transfer"
                );
                err
            })?;

        self.transfers.close_in_op(op, &mut active, None).await?;
        self.transfers
            .close_in_op(op, &mut buyback, Some(NewTransferDetails::from(loan)))
            .await?;
        if !self
            .transfers
            .unmap_loan_in_op(op, active.loan_id(), active.id())
            .await?
        {
            tracing::warn!(
                loan_id = %active.loan_id(),
                active_id = %active.id(),
                "owner loan mapping already removed"
            );
        }
        self.journal_entries
            .post_buyback_in_op(op, loan, &buyback)
            .await?;

        tracing::info!(
            active_id = %active.id(),
            buyback_id = %buyback.id(),
            owner_id = %buyback.owner_id(),
            "buyback executed"
        );
        op.accumulate([
            ownership_transferred(&buyback, loan),
            loan_account_snapshot(loan),
        ]);
        Ok(buyback)
    }
}

fn ownership_transferred(transfer: &Transfer, loan: &LoanValues) -> OutboxEventPayload {
    OutboxEventPayload::OwnershipTransferred {
        transfer: transfer.values().clone(),
        loan: loan.clone(),
    }
}

fn loan_account_snapshot(loan: &LoanValues) -> OutboxEventPayload {
    OutboxEventPayload::LoanAccountSnapshot { loan: loan.clone() }
}
