use chrono::NaiveDate;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::{entity::*, error::*};
use crate::{
    primitives::*,
    query::{Page, PagingArgs},
};

const SELECT_ENTRIES: &str = r#"SELECT e.id, e.office_id, e.currency, e.account_id, e.loan_id,
       e.transaction_id, e.direction, e.amount, e.transaction_date,
       e.submitted_on_date, e.reversed
FROM loan_transfer_journal_entries e"#;

#[derive(sqlx::FromRow)]
struct JournalEntryRow {
    id: JournalEntryId,
    office_id: OfficeId,
    currency: String,
    account_id: LedgerAccountId,
    loan_id: Option<LoanId>,
    transaction_id: String,
    direction: String,
    amount: String,
    transaction_date: NaiveDate,
    submitted_on_date: NaiveDate,
    reversed: bool,
}

impl TryFrom<JournalEntryRow> for JournalEntryValues {
    type Error = JournalEntryError;

    fn try_from(row: JournalEntryRow) -> Result<Self, Self::Error> {
        Ok(JournalEntryValues {
            id: row.id,
            office_id: row.office_id,
            currency: row.currency.parse()?,
            account_id: row.account_id,
            loan_id: row.loan_id,
            transaction_id: row.transaction_id,
            direction: row.direction.parse()?,
            amount: row.amount.parse()?,
            transaction_date: row.transaction_date,
            submitted_on_date: row.submitted_on_date,
            reversed: row.reversed,
        })
    }
}

#[derive(Clone)]
pub(super) struct JournalEntryRepo {
    pool: SqlitePool,
}

impl JournalEntryRepo {
    pub(super) fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }

    pub(super) async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        new_entry: NewJournalEntry,
    ) -> Result<JournalEntryValues, JournalEntryError> {
        let id = sqlx::query(
            r#"INSERT INTO loan_transfer_journal_entries
               (office_id, currency, account_id, loan_id, transaction_id, direction,
                amount, transaction_date, submitted_on_date, reversed)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE)"#,
        )
        .bind(new_entry.office_id)
        .bind(new_entry.currency.code())
        .bind(new_entry.account_id)
        .bind(new_entry.loan_id)
        .bind(new_entry.transaction_id.as_str())
        .bind(new_entry.direction.to_string())
        .bind(new_entry.amount.to_string())
        .bind(new_entry.transaction_date)
        .bind(new_entry.submitted_on_date)
        .execute(&mut **tx)
        .await?
        .last_insert_rowid();

        Ok(JournalEntryValues {
            id: JournalEntryId::from(id),
            office_id: new_entry.office_id,
            currency: new_entry.currency,
            account_id: new_entry.account_id,
            loan_id: Some(new_entry.loan_id),
            transaction_id: new_entry.transaction_id,
            direction: new_entry.direction,
            amount: new_entry.amount,
            transaction_date: new_entry.transaction_date,
            submitted_on_date: new_entry.submitted_on_date,
            reversed: false,
        })
    }

    /// Stores an entry posted by the loan system. The entry keeps its own id
    /// as `external_entry_id` and receives a local row id, so it never
    /// collides with the engine's postings. Returns the local id and whether
    /// the entry was already stored.
    pub(super) async fn import_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        entry: &JournalEntryValues,
    ) -> Result<(JournalEntryId, bool), JournalEntryError> {
        let existing: Option<JournalEntryId> = sqlx::query_scalar(
            "SELECT id FROM loan_transfer_journal_entries WHERE external_entry_id = ?",
        )
        .bind(entry.id)
        .fetch_optional(&mut **tx)
        .await?;
        if let Some(id) = existing {
            return Ok((id, true));
        }

        let id = sqlx::query(
            r#"INSERT INTO loan_transfer_journal_entries
               (external_entry_id, office_id, currency, account_id, loan_id, transaction_id,
                direction, amount, transaction_date, submitted_on_date, reversed)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(entry.id)
        .bind(entry.office_id)
        .bind(entry.currency.code())
        .bind(entry.account_id)
        .bind(entry.loan_id)
        .bind(entry.transaction_id.as_str())
        .bind(entry.direction.to_string())
        .bind(entry.amount.to_string())
        .bind(entry.transaction_date)
        .bind(entry.submitted_on_date)
        .bind(entry.reversed)
        .execute(&mut **tx)
        .await?
        .last_insert_rowid();
        Ok((JournalEntryId::from(id), false))
    }

    pub(super) async fn map_to_transfer_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        transfer_id: TransferId,
        entry_id: JournalEntryId,
    ) -> Result<(), JournalEntryError> {
        sqlx::query(
            "INSERT INTO loan_transfer_transfer_journal_entry_mappings (transfer_id, journal_entry_id) VALUES (?, ?)",
        )
        .bind(transfer_id)
        .bind(entry_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub(super) async fn map_to_owner_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        owner_id: OwnerId,
        entry_id: JournalEntryId,
    ) -> Result<(), JournalEntryError> {
        sqlx::query(
            "INSERT OR IGNORE INTO loan_transfer_owner_journal_entry_mappings (owner_id, journal_entry_id) VALUES (?, ?)",
        )
        .bind(owner_id)
        .bind(entry_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub(super) async fn list_for_transfer(
        &self,
        transfer_id: TransferId,
        paging: PagingArgs,
    ) -> Result<Page<JournalEntryValues>, JournalEntryError> {
        self.list_mapped(
            "loan_transfer_transfer_journal_entry_mappings",
            "transfer_id",
            i64::from(transfer_id),
            paging,
        )
        .await
    }

    pub(super) async fn list_for_owner(
        &self,
        owner_id: OwnerId,
        paging: PagingArgs,
    ) -> Result<Page<JournalEntryValues>, JournalEntryError> {
        self.list_mapped(
            "loan_transfer_owner_journal_entry_mappings",
            "owner_id",
            i64::from(owner_id),
            paging,
        )
        .await
    }

    async fn list_mapped(
        &self,
        mapping_table: &'static str,
        key_column: &'static str,
        key: i64,
        paging: PagingArgs,
    ) -> Result<Page<JournalEntryValues>, JournalEntryError> {
        let total_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {mapping_table} WHERE {key_column} = ?"
        ))
        .bind(key)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, JournalEntryRow>(&format!(
            "{SELECT_ENTRIES} JOIN {mapping_table} m ON m.journal_entry_id = e.id WHERE m.{key_column} = ? ORDER BY e.id LIMIT ? OFFSET ?"
        ))
        .bind(key)
        .bind(paging.limit)
        .bind(paging.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            total_count,
            offset: paging.offset,
            limit: paging.limit,
            entities: rows
                .into_iter()
                .map(JournalEntryValues::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}
