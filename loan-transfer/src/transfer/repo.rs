use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool, Transaction};

use super::{entity::*, error::*, TransferFilter};
use crate::{
    primitives::*,
    query::{Page, PagingArgs},
};

const SELECT_TRANSFERS: &str = r#"SELECT t.id, t.owner_id, o.external_id AS owner_external_id,
       t.external_id, t.status, t.sub_status, t.loan_id, t.external_loan_id,
       t.settlement_date, t.effective_date_from, t.effective_date_to,
       t.purchase_price_ratio, t.details_id,
       d.total_outstanding, d.principal_outstanding, d.interest_outstanding,
       d.fee_charges_outstanding, d.penalty_charges_outstanding, d.total_overpaid
FROM loan_transfer_transfers t
JOIN loan_transfer_owners o ON o.id = t.owner_id
LEFT JOIN loan_transfer_details d ON d.id = t.details_id
WHERE "#;

#[derive(sqlx::FromRow)]
struct TransferRow {
    id: TransferId,
    owner_id: OwnerId,
    owner_external_id: String,
    external_id: Option<String>,
    status: String,
    sub_status: Option<String>,
    loan_id: LoanId,
    external_loan_id: Option<String>,
    settlement_date: NaiveDate,
    effective_date_from: NaiveDate,
    effective_date_to: NaiveDate,
    purchase_price_ratio: String,
    details_id: Option<TransferDetailsId>,
    total_outstanding: Option<String>,
    principal_outstanding: Option<String>,
    interest_outstanding: Option<String>,
    fee_charges_outstanding: Option<String>,
    penalty_charges_outstanding: Option<String>,
    total_overpaid: Option<String>,
}

fn decimal(value: Option<String>) -> Result<Decimal, TransferError> {
    Ok(value.as_deref().map(str::parse::<Decimal>).transpose()?.unwrap_or_default())
}

impl TryFrom<TransferRow> for Transfer {
    type Error = TransferError;

    fn try_from(row: TransferRow) -> Result<Self, Self::Error> {
        let details = match row.details_id {
            Some(id) => Some(TransferDetails {
                id,
                total_outstanding: decimal(row.total_outstanding)?,
                principal_outstanding: decimal(row.principal_outstanding)?,
                interest_outstanding: decimal(row.interest_outstanding)?,
                fee_charges_outstanding: decimal(row.fee_charges_outstanding)?,
                penalty_charges_outstanding: decimal(row.penalty_charges_outstanding)?,
                total_overpaid: decimal(row.total_overpaid)?,
            }),
            None => None,
        };
        Ok(Transfer::from(TransferValues {
            id: row.id,
            owner_id: row.owner_id,
            owner_external_id: row.owner_external_id,
            external_id: row.external_id,
            status: row.status.parse()?,
            sub_status: row
                .sub_status
                .as_deref()
                .map(str::parse::<TransferSubStatus>)
                .transpose()?,
            loan_id: row.loan_id,
            external_loan_id: row.external_loan_id,
            settlement_date: row.settlement_date,
            effective_date_from: row.effective_date_from,
            effective_date_to: row.effective_date_to,
            purchase_price_ratio: row.purchase_price_ratio,
            details,
        }))
    }
}

fn into_transfers(rows: Vec<TransferRow>) -> Result<Vec<Transfer>, TransferError> {
    rows.into_iter().map(Transfer::try_from).collect()
}

#[derive(Clone)]
pub(super) struct TransferRepo {
    pool: SqlitePool,
}

impl TransferRepo {
    pub(super) fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }

    pub(super) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(super) async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        new_transfer: NewTransfer,
    ) -> Result<Transfer, TransferError> {
        let details = match new_transfer.details {
            Some(details) => Some(self.create_details_in_tx(tx, details).await?),
            None => None,
        };
        let id = sqlx::query(
            r#"INSERT INTO loan_transfer_transfers
               (owner_id, external_id, status, sub_status, loan_id, external_loan_id,
                settlement_date, effective_date_from, effective_date_to,
                purchase_price_ratio, details_id)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_transfer.owner_id)
        .bind(new_transfer.external_id.as_deref())
        .bind(new_transfer.status.as_ref())
        .bind(new_transfer.sub_status.map(|s| s.to_string()))
        .bind(new_transfer.loan_id)
        .bind(new_transfer.external_loan_id.as_deref())
        .bind(new_transfer.settlement_date)
        .bind(new_transfer.effective_date_from)
        .bind(new_transfer.effective_date_to)
        .bind(new_transfer.purchase_price_ratio.as_str())
        .bind(details.as_ref().map(|d| d.id))
        .execute(&mut **tx)
        .await?
        .last_insert_rowid();

        Ok(Transfer::from(TransferValues {
            id: TransferId::from(id),
            owner_id: new_transfer.owner_id,
            owner_external_id: new_transfer.owner_external_id,
            external_id: new_transfer.external_id,
            status: new_transfer.status,
            sub_status: new_transfer.sub_status,
            loan_id: new_transfer.loan_id,
            external_loan_id: new_transfer.external_loan_id,
            settlement_date: new_transfer.settlement_date,
            effective_date_from: new_transfer.effective_date_from,
            effective_date_to: new_transfer.effective_date_to,
            purchase_price_ratio: new_transfer.purchase_price_ratio,
            details,
        }))
    }

    async fn create_details_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        details: NewTransferDetails,
    ) -> Result<TransferDetails, TransferError> {
        let id = sqlx::query(
            r#"INSERT INTO loan_transfer_details
               (total_outstanding, principal_outstanding, interest_outstanding,
                fee_charges_outstanding, penalty_charges_outstanding, total_overpaid)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(details.total_outstanding.to_string())
        .bind(details.principal_outstanding.to_string())
        .bind(details.interest_outstanding.to_string())
        .bind(details.fee_charges_outstanding.to_string())
        .bind(details.penalty_charges_outstanding.to_string())
        .bind(details.total_overpaid.to_string())
        .execute(&mut **tx)
        .await?
        .last_insert_rowid();
        Ok(details.into_details(TransferDetailsId::from(id)))
    }

    /// Closes the validity window of an open row, optionally attaching a
    /// balance snapshot.
    pub(super) async fn close_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        transfer: &mut Transfer,
        on: NaiveDate,
        details: Option<NewTransferDetails>,
    ) -> Result<(), TransferError> {
        let details = match details {
            Some(details) => Some(self.create_details_in_tx(tx, details).await?),
            None => None,
        };
        let details_id = details.as_ref().map(|d| d.id);
        transfer.close(on, details)?;
        let result = sqlx::query(
            r#"UPDATE loan_transfer_transfers
               SET effective_date_to = ?, details_id = COALESCE(?, details_id)
               WHERE id = ? AND effective_date_to = ?"#,
        )
        .bind(on)
        .bind(details_id)
        .bind(transfer.id())
        .bind(open_effective_date())
        .execute(&mut **tx)
        .await?;
        if result.rows_affected() != 1 {
            return Err(TransferError::ConcurrentModification(transfer.id()));
        }
        Ok(())
    }

    pub(super) async fn find_by_id<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        id: TransferId,
    ) -> Result<Transfer, TransferError> {
        let row = sqlx::query_as::<_, TransferRow>(&format!("{SELECT_TRANSFERS} t.id = ?"))
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(TransferError::NotFound(id))?;
        Transfer::try_from(row)
    }

    pub(super) async fn find_latest_open_by_external_id<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        external_id: &str,
    ) -> Result<Option<Transfer>, TransferError> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            "{SELECT_TRANSFERS} t.external_id = ? AND t.effective_date_to = ? ORDER BY t.id DESC LIMIT 1"
        ))
        .bind(external_id)
        .bind(open_effective_date())
        .fetch_optional(executor)
        .await?;
        row.map(Transfer::try_from).transpose()
    }

    pub(super) async fn external_id_exists<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        external_id: &str,
    ) -> Result<bool, TransferError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loan_transfer_transfers WHERE external_id = ?)",
        )
        .bind(external_id)
        .fetch_one(executor)
        .await?;
        Ok(exists)
    }

    /// Open rows of the loan in one of `statuses`, optionally restricted to
    /// a settlement date, ascending by id.
    pub(super) async fn find_open_for_loan<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        loan_id: LoanId,
        statuses: &[TransferStatus],
        settlement_date: Option<NaiveDate>,
    ) -> Result<Vec<Transfer>, TransferError> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_TRANSFERS);
        query
            .push("t.loan_id = ")
            .push_bind(loan_id)
            .push(" AND t.effective_date_to = ")
            .push_bind(open_effective_date());
        if let Some(date) = settlement_date {
            query.push(" AND t.settlement_date = ").push_bind(date);
        }
        query.push(" AND t.status IN (");
        let mut separated = query.separated(", ");
        for status in statuses {
            separated.push_bind(status.to_string());
        }
        separated.push_unseparated(") ORDER BY t.id");

        let rows = query
            .build_query_as::<TransferRow>()
            .fetch_all(executor)
            .await?;
        into_transfers(rows)
    }

    pub(super) async fn find_open_active_for_owner<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        loan_id: LoanId,
        owner_id: OwnerId,
    ) -> Result<Option<Transfer>, TransferError> {
        let row = sqlx::query_as::<_, TransferRow>(&format!(
            "{SELECT_TRANSFERS} t.loan_id = ? AND t.owner_id = ? AND t.status = ? AND t.effective_date_to = ? ORDER BY t.id DESC LIMIT 1"
        ))
        .bind(loan_id)
        .bind(owner_id)
        .bind(TransferStatus::Active.as_ref())
        .bind(open_effective_date())
        .fetch_optional(executor)
        .await?;
        row.map(Transfer::try_from).transpose()
    }

    pub(super) async fn list(
        &self,
        filter: &TransferFilter,
        paging: PagingArgs,
    ) -> Result<Page<Transfer>, TransferError> {
        let mut count =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM loan_transfer_transfers t WHERE ");
        push_filter(&mut count, filter);
        let total_count: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(SELECT_TRANSFERS);
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY t.id LIMIT ")
            .push_bind(paging.limit)
            .push(" OFFSET ")
            .push_bind(paging.offset);
        let rows = query
            .build_query_as::<TransferRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            total_count,
            offset: paging.offset,
            limit: paging.limit,
            entities: into_transfers(rows)?,
        })
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &TransferFilter) {
    match filter {
        TransferFilter::LoanId(loan_id) => {
            query.push("t.loan_id = ").push_bind(*loan_id);
        }
        TransferFilter::ExternalLoanId(external_loan_id) => {
            query
                .push("t.external_loan_id = ")
                .push_bind(external_loan_id.clone());
        }
        TransferFilter::ExternalId(external_id) => {
            query.push("t.external_id = ").push_bind(external_id.clone());
        }
    }
}
