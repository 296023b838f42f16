use async_trait::async_trait;
use tracing::instrument;

use super::{error::ExecutionError, TransferExecutor};
use crate::{
    atomic_operation::Operations,
    loan::LoanValues,
    transfer::{TransferStatus, TransferSubStatus, Transfers},
};

/// Receives loans that became closed or overpaid.
#[async_trait]
pub trait LoanStatusChangeHandler: Send + Sync {
    async fn on_loan_closed_or_overpaid(&self, loan: &LoanValues) -> Result<(), ExecutionError>;
}

/// Resolves every open intent of a loan that can no longer be sold as it is.
/// Re-delivery of the same loan finds no open intents and writes nothing.
#[derive(Clone)]
pub struct LoanClosureReactions {
    ops: Operations,
    transfers: Transfers,
    executor: TransferExecutor,
}

impl LoanClosureReactions {
    pub(crate) fn new(ops: &Operations, transfers: &Transfers, executor: &TransferExecutor) -> Self {
        Self {
            ops: ops.clone(),
            transfers: transfers.clone(),
            executor: executor.clone(),
        }
    }
}

#[async_trait]
impl LoanStatusChangeHandler for LoanClosureReactions {
    #[instrument(
        name = "loan_transfer.loan_closure.on_loan_closed_or_overpaid",
        skip(self, loan),
        fields(loan_id = %loan.id, status = %loan.status),
        err
    )]
    async fn on_loan_closed_or_overpaid(&self, loan: &LoanValues) -> Result<(), ExecutionError> {
        let mut op = self.ops.begin_for_loan(loan.id).await?;
        let intents = self
            .transfers
            .open_intents_for_loan_in_op(&mut op, loan.id)
            .await?;

        let mut intents = intents.into_inner().into_iter();
        match (intents.next(), intents.next()) {
            (None, _) => {
                tracing::debug!("no open transfer intents");
                return Ok(());
            }
            (Some(pending), None) if pending.status() == TransferStatus::Pending => {
                self.executor.decline_in_op(&mut op, loan, pending).await?;
            }
            (Some(buyback), None) => {
                self.executor
                    .execute_buyback_in_op(&mut op, loan, buyback)
                    .await?;
            }
            (Some(first), Some(second)) => {
                let (sale, buyback) = TransferExecutor::sale_then_buyback(first, second)?;
                if sale.settlement_date() == buyback.settlement_date() {
                    self.executor
                        .cancel_in_op(&mut op, loan, sale, TransferSubStatus::SamedayTransfers)
                        .await?;
                    self.executor
                        .cancel_in_op(&mut op, loan, buyback, TransferSubStatus::SamedayTransfers)
                        .await?;
                } else {
                    self.executor.decline_in_op(&mut op, loan, sale).await?;
                    self.executor
                        .cancel_in_op(&mut op, loan, buyback, TransferSubStatus::Unsold)
                        .await?;
                }
            }
        }
        op.commit().await?;
        Ok(())
    }
}
