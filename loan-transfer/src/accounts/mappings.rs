use serde::{Deserialize, Serialize};

use std::collections::HashMap;

use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAccountMapping {
    pub product_id: LoanProductId,
    pub purpose: AccountPurpose,
    pub account_id: LedgerAccountId,
}

/// Static product account configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<ProductAccountMapping>", into = "Vec<ProductAccountMapping>")]
pub struct ProductAccountMappings {
    accounts: HashMap<(LoanProductId, AccountPurpose), LedgerAccountId>,
}

impl ProductAccountMappings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        product_id: impl Into<LoanProductId>,
        purpose: AccountPurpose,
        account_id: impl Into<LedgerAccountId>,
    ) -> Self {
        self.insert(product_id, purpose, account_id);
        self
    }

    pub fn insert(
        &mut self,
        product_id: impl Into<LoanProductId>,
        purpose: AccountPurpose,
        account_id: impl Into<LedgerAccountId>,
    ) {
        self.accounts
            .insert((product_id.into(), purpose), account_id.into());
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountResolver for ProductAccountMappings {
    fn resolve(
        &self,
        product_id: LoanProductId,
        purpose: AccountPurpose,
    ) -> Result<LedgerAccountId, AccountResolverError> {
        self.accounts
            .get(&(product_id, purpose))
            .copied()
            .ok_or(AccountResolverError::MissingMapping {
                product_id,
                purpose,
            })
    }
}

impl From<Vec<ProductAccountMapping>> for ProductAccountMappings {
    fn from(mappings: Vec<ProductAccountMapping>) -> Self {
        let mut res = Self::new();
        for m in mappings {
            res.insert(m.product_id, m.purpose, m.account_id);
        }
        res
    }
}

impl From<ProductAccountMappings> for Vec<ProductAccountMapping> {
    fn from(mappings: ProductAccountMappings) -> Self {
        let mut res: Vec<_> = mappings
            .accounts
            .into_iter()
            .map(|((product_id, purpose), account_id)| ProductAccountMapping {
                product_id,
                purpose,
                account_id,
            })
            .collect();
        res.sort_by_key(|m| (m.product_id, m.account_id));
        res
    }
}
