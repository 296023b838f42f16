use thiserror::Error;

use super::AccountPurpose;
use crate::primitives::LoanProductId;

#[derive(Error, Debug)]
pub enum AccountResolverError {
    #[error("AccountResolverError - MissingMapping: no {purpose} account for product {product_id}")]
    MissingMapping {
        product_id: LoanProductId,
        purpose: AccountPurpose,
    },
}
