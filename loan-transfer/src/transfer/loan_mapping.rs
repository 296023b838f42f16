use sqlx::{Executor, Sqlite, Transaction};

use super::error::TransferError;
use crate::primitives::*;

/// Fast lookup of the ACTIVE transfer through which a loan is owned.
#[derive(Clone)]
pub(super) struct OwnerLoanMappingRepo;

impl OwnerLoanMappingRepo {
    pub(super) async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        loan_id: LoanId,
        transfer_id: TransferId,
    ) -> Result<(), TransferError> {
        sqlx::query(
            "INSERT INTO loan_transfer_owner_loan_mappings (loan_id, owner_transfer_id) VALUES (?, ?)",
        )
        .bind(loan_id)
        .bind(transfer_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Returns whether a mapping was removed.
    pub(super) async fn delete_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        loan_id: LoanId,
        transfer_id: TransferId,
    ) -> Result<bool, TransferError> {
        let result = sqlx::query(
            "DELETE FROM loan_transfer_owner_loan_mappings WHERE loan_id = ? AND owner_transfer_id = ?",
        )
        .bind(loan_id)
        .bind(transfer_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(super) async fn find_by_loan<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        loan_id: LoanId,
    ) -> Result<Option<(TransferId, OwnerId)>, TransferError> {
        let row = sqlx::query_as(
            r#"SELECT m.owner_transfer_id, t.owner_id
               FROM loan_transfer_owner_loan_mappings m
               JOIN loan_transfer_transfers t ON t.id = m.owner_transfer_id
               WHERE m.loan_id = ?"#,
        )
        .bind(loan_id)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }
}
