use sqlx::{Executor, Sqlite, SqlitePool, Transaction};

use super::{error::*, OwnerValues};
use crate::primitives::OwnerId;

#[derive(Clone)]
pub(super) struct OwnerRepo {
    pool: SqlitePool,
}

impl OwnerRepo {
    pub(super) fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }

    pub(super) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(super) async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        external_id: &str,
    ) -> Result<OwnerValues, OwnerError> {
        let id = sqlx::query("INSERT INTO loan_transfer_owners (external_id) VALUES (?)")
            .bind(external_id)
            .execute(&mut **tx)
            .await?
            .last_insert_rowid();
        Ok(OwnerValues {
            id: OwnerId::from(id),
            external_id: external_id.to_string(),
        })
    }

    pub(super) async fn find_by_external_id<'e>(
        &self,
        executor: impl Executor<'e, Database = Sqlite>,
        external_id: &str,
    ) -> Result<Option<OwnerValues>, OwnerError> {
        let row: Option<(OwnerId, String)> =
            sqlx::query_as("SELECT id, external_id FROM loan_transfer_owners WHERE external_id = ?")
                .bind(external_id)
                .fetch_optional(executor)
                .await?;
        Ok(row.map(|(id, external_id)| OwnerValues { id, external_id }))
    }
}
