use async_trait::async_trait;
use thiserror::Error;

pub use transfer_types::loan::*;

use crate::primitives::LoanId;

#[derive(Error, Debug)]
#[error("LoanLookupError: {0}")]
pub struct LoanLookupError(pub String);

/// Read access to the loan aggregate owned by the loan servicing system.
#[async_trait]
pub trait LoanLookup: Send + Sync {
    async fn find_by_id(&self, id: LoanId) -> Result<Option<LoanValues>, LoanLookupError>;
}
