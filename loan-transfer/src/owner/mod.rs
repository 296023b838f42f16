pub mod error;
mod repo;

use sqlx::SqlitePool;
use tracing::instrument;

pub use transfer_types::owner::*;

use crate::AtomicOperation;
use error::*;
use repo::*;

#[derive(Clone)]
pub struct Owners {
    repo: OwnerRepo,
}

impl Owners {
    pub(crate) fn new(pool: &SqlitePool) -> Self {
        Self {
            repo: OwnerRepo::new(pool),
        }
    }

    #[instrument(name = "loan_transfer.owners.find_by_external_id", skip(self), err)]
    pub async fn find_by_external_id(&self, external_id: &str) -> Result<OwnerValues, OwnerError> {
        self.repo
            .find_by_external_id(self.repo.pool(), external_id)
            .await?
            .ok_or_else(|| OwnerError::CouldNotFindByExternalId(external_id.to_string()))
    }

    pub(crate) async fn find_or_create_in_op(
        &self,
        op: &mut AtomicOperation,
        external_id: &str,
    ) -> Result<OwnerValues, OwnerError> {
        if let Some(owner) = self
            .repo
            .find_by_external_id(&mut **op.tx(), external_id)
            .await?
        {
            return Ok(owner);
        }
        self.repo.create_in_tx(op.tx(), external_id).await
    }
}
