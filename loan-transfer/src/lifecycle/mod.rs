mod command;
pub mod error;

use tracing::instrument;
use uuid::Uuid;

use std::sync::Arc;

use crate::{
    atomic_operation::Operations,
    loan::{LoanLookup, LoanValues},
    owner::Owners,
    primitives::*,
    transfer::{error::TransferError, *},
    AtomicOperation,
};

pub use command::*;
use error::*;

/// Sale, buyback and cancel commands. Each command reads the loan's
/// effective transfer set and writes at most one close and one insert
/// inside a single operation holding the loan's lock.
#[derive(Clone)]
pub struct TransferLifecycle {
    ops: Operations,
    transfers: Transfers,
    owners: Owners,
    loans: Arc<dyn LoanLookup>,
    auto_generate_external_id: bool,
}

impl TransferLifecycle {
    pub(crate) fn new(
        ops: &Operations,
        transfers: &Transfers,
        owners: &Owners,
        loans: Arc<dyn LoanLookup>,
        auto_generate_external_id: bool,
    ) -> Self {
        Self {
            ops: ops.clone(),
            transfers: transfers.clone(),
            owners: owners.clone(),
            loans,
            auto_generate_external_id,
        }
    }

    #[instrument(
        name = "loan_transfer.lifecycle.sale",
        skip(self),
        fields(loan_id = %command.loan_id),
        err
    )]
    pub async fn sale(&self, command: SaleCommand) -> Result<TransferCommandResult, LifecycleError> {
        let mut op = self.ops.begin_for_loan(command.loan_id).await?;
        let business_date = op.business_date();
        if command.settlement_date < business_date {
            return Err(LifecycleError::SettlementDateInPast);
        }
        let external_id = self
            .unique_external_id(&mut op, command.external_id)
            .await?;
        let loan = self.find_loan(command.loan_id).await?;
        if !loan.status.allows_sale() {
            return Err(LifecycleError::LoanNotEligible {
                loan_id: loan.id,
                status: loan.status,
            });
        }

        let owner = self
            .owners
            .find_or_create_in_op(&mut op, &command.owner_external_id)
            .await?;
        let effective = self
            .transfers
            .effective_for_loan_in_op(&mut op, loan.id)
            .await?;
        match (effective.len(), effective.latest().map(Transfer::status)) {
            (0, _) => (),
            (1, Some(TransferStatus::Pending)) => return Err(LifecycleError::AlreadyPendingSale),
            (1, Some(TransferStatus::Active)) => {
                return Err(LifecycleError::AlreadyOwnedExternally)
            }
            (1, Some(status)) => return Err(LifecycleError::InvalidTransferState(status)),
            _ => return Err(LifecycleError::TransferAlreadyInProgress),
        }

        let new_transfer = NewTransfer::builder()
            .owner_id(owner.id)
            .owner_external_id(owner.external_id)
            .external_id(external_id)
            .status(TransferStatus::Pending)
            .loan_id(loan.id)
            .external_loan_id(loan.external_id.clone())
            .settlement_date(command.settlement_date)
            .effective_date_from(business_date)
            .purchase_price_ratio(command.purchase_price_ratio)
            .build()?;
        let transfer = self.transfers.create_in_op(&mut op, new_transfer).await?;
        op.commit().await?;

        tracing::info!(transfer_id = %transfer.id(), "sale requested");
        Ok(TransferCommandResult::from(&transfer))
    }

    #[instrument(
        name = "loan_transfer.lifecycle.buyback",
        skip(self),
        fields(loan_id = %command.loan_id),
        err
    )]
    pub async fn buyback(
        &self,
        command: BuybackCommand,
    ) -> Result<TransferCommandResult, LifecycleError> {
        let mut op = self.ops.begin_for_loan(command.loan_id).await?;
        let business_date = op.business_date();
        let loan = self.find_loan(command.loan_id).await?;
        if command.settlement_date < business_date {
            return Err(LifecycleError::SettlementDateInPast);
        }
        let external_id = self
            .unique_external_id(&mut op, command.external_id)
            .await?;

        let effective = self
            .transfers
            .effective_for_loan_in_op(&mut op, loan.id)
            .await?;
        let current = match (effective.len(), effective.latest()) {
            (0, _) | (_, None) => return Err(LifecycleError::NotExternallyOwned),
            (1, Some(current)) => current,
            _ => return Err(LifecycleError::BuybackAlreadyInProgress),
        };
        if !matches!(
            current.status(),
            TransferStatus::Pending | TransferStatus::Active
        ) {
            return Err(LifecycleError::WrongTransferState(current.status()));
        }
        if command.settlement_date < current.settlement_date() {
            return Err(LifecycleError::SettlementDateTooEarly(
                current.settlement_date(),
            ));
        }

        let current = current.values();
        let new_transfer = NewTransfer::builder()
            .owner_id(current.owner_id)
            .owner_external_id(current.owner_external_id.clone())
            .external_id(external_id)
            .status(TransferStatus::Buyback)
            .loan_id(loan.id)
            .external_loan_id(loan.external_id.clone())
            .settlement_date(command.settlement_date)
            .effective_date_from(business_date)
            .purchase_price_ratio(current.purchase_price_ratio.clone())
            .build()?;
        let transfer = self.transfers.create_in_op(&mut op, new_transfer).await?;
        op.commit().await?;

        tracing::info!(transfer_id = %transfer.id(), "buyback requested");
        Ok(TransferCommandResult::from(&transfer))
    }

    #[instrument(name = "loan_transfer.lifecycle.cancel", skip(self), err)]
    pub async fn cancel(&self, id: TransferId) -> Result<TransferCommandResult, LifecycleError> {
        let transfer = match self.transfers.find_by_id(id).await {
            Ok(transfer) => transfer,
            Err(TransferError::NotFound(_)) => return Err(LifecycleError::TransferNotFound(id)),
            Err(e) => return Err(e.into()),
        };
        self.cancel_latest(transfer.loan_id(), id).await
    }

    #[instrument(name = "loan_transfer.lifecycle.cancel_by_external_id", skip(self), err)]
    pub async fn cancel_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<TransferCommandResult, LifecycleError> {
        let transfer = self
            .transfers
            .find_latest_open_by_external_id(external_id)
            .await?
            .ok_or_else(|| LifecycleError::TransferNotFoundByExternalId(external_id.to_string()))?;
        self.cancel_latest(transfer.loan_id(), transfer.id()).await
    }

    async fn cancel_latest(
        &self,
        loan_id: LoanId,
        id: TransferId,
    ) -> Result<TransferCommandResult, LifecycleError> {
        let mut op = self.ops.begin_for_loan(loan_id).await?;
        let mut transfer = self.transfers.find_by_id_in_op(&mut op, id).await?;
        let effective = self
            .transfers
            .effective_for_loan_in_op(&mut op, loan_id)
            .await?;
        if effective.latest().map(Transfer::id) != Some(id) {
            return Err(LifecycleError::NotLatestTransfer(id));
        }
        if !transfer.status().is_cancellable() {
            return Err(LifecycleError::NotCancellable {
                id,
                status: transfer.status(),
            });
        }

        let date = op.business_date();
        let successor = NewTransfer::successor_of(&transfer)
            .status(TransferStatus::Cancelled)
            .sub_status(TransferSubStatus::UserRequested)
            .effective_date_from(date)
            .effective_date_to(date)
            .build()?;
        let cancelled = self
            .transfers
            .supersede_in_op(&mut op, &mut transfer, successor)
            .await?;
        op.commit().await?;

        tracing::info!(transfer_id = %id, cancelled_id = %cancelled.id(), "transfer cancelled");
        Ok(TransferCommandResult::from(&cancelled))
    }

    async fn find_loan(&self, loan_id: LoanId) -> Result<LoanValues, LifecycleError> {
        self.loans
            .find_by_id(loan_id)
            .await?
            .ok_or(LifecycleError::LoanNotFound(loan_id))
    }

    async fn unique_external_id(
        &self,
        op: &mut AtomicOperation,
        external_id: Option<String>,
    ) -> Result<Option<String>, LifecycleError> {
        match external_id {
            Some(external_id) => {
                if self
                    .transfers
                    .external_id_exists_in_op(op, &external_id)
                    .await?
                {
                    return Err(LifecycleError::DuplicateTransferId(external_id));
                }
                Ok(Some(external_id))
            }
            None if self.auto_generate_external_id => Ok(Some(Uuid::new_v4().to_string())),
            None => Ok(None),
        }
    }
}
