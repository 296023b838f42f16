use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::{error::ExecutionError, TransferExecutor};
use crate::{
    atomic_operation::Operations,
    loan::LoanValues,
    primitives::*,
    transfer::{Transfer, TransferStatus, TransferSubStatus, Transfers},
};

/// What the settlement of one loan on the business date resulted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    NothingDue,
    SaleExecuted { active_id: TransferId },
    SaleDeclined { declined_id: TransferId },
    BuybackExecuted { buyback_id: TransferId },
    SameDayCancelled { cancelled_ids: [TransferId; 2] },
}

/// Close-of-business step executing the intents of a loan whose settlement
/// date is the business date.
#[derive(Clone)]
pub struct SettlementStep {
    ops: Operations,
    transfers: Transfers,
    executor: TransferExecutor,
}

impl SettlementStep {
    pub(crate) fn new(ops: &Operations, transfers: &Transfers, executor: &TransferExecutor) -> Self {
        Self {
            ops: ops.clone(),
            transfers: transfers.clone(),
            executor: executor.clone(),
        }
    }

    #[instrument(
        name = "loan_transfer.settlement.execute",
        skip(self, loan),
        fields(loan_id = %loan.id),
        err
    )]
    pub async fn execute(&self, loan: &LoanValues) -> Result<SettlementOutcome, ExecutionError> {
        let mut op = self.ops.begin_for_loan(loan.id).await?;
        let date = op.business_date();
        let due = self
            .transfers
            .due_for_settlement_in_op(&mut op, loan.id, date)
            .await?;

        let mut due = due.into_inner().into_iter();
        let outcome = match (due.next(), due.next()) {
            (None, _) => return Ok(SettlementOutcome::NothingDue),
            (Some(first), Some(second)) => {
                let (sale, buyback) = TransferExecutor::sale_then_buyback(first, second)?;
                let sale = self
                    .executor
                    .cancel_in_op(&mut op, loan, sale, TransferSubStatus::SamedayTransfers)
                    .await?;
                let buyback = self
                    .executor
                    .cancel_in_op(&mut op, loan, buyback, TransferSubStatus::SamedayTransfers)
                    .await?;
                SettlementOutcome::SameDayCancelled {
                    cancelled_ids: [sale.id(), buyback.id()],
                }
            }
            (Some(buyback), None) if buyback.status() == TransferStatus::Buyback => {
                let buyback = self
                    .executor
                    .execute_buyback_in_op(&mut op, loan, buyback)
                    .await?;
                SettlementOutcome::BuybackExecuted {
                    buyback_id: buyback.id(),
                }
            }
            (Some(pending), None) => self.settle_sale(&mut op, loan, pending).await?,
        };
        op.commit().await?;

        tracing::info!(%date, ?outcome, "settlement completed");
        Ok(outcome)
    }

    async fn settle_sale(
        &self,
        op: &mut crate::AtomicOperation,
        loan: &LoanValues,
        pending: Transfer,
    ) -> Result<SettlementOutcome, ExecutionError> {
        if loan.total_outstanding() > Decimal::ZERO {
            let active = self.executor.execute_sale_in_op(op, loan, pending).await?;
            Ok(SettlementOutcome::SaleExecuted {
                active_id: active.id(),
            })
        } else {
            let declined = self.executor.decline_in_op(op, loan, pending).await?;
            Ok(SettlementOutcome::SaleDeclined {
                declined_id: declined.id(),
            })
        }
    }
}
