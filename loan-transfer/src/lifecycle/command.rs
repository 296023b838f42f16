use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{primitives::*, transfer::Transfer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleCommand {
    pub loan_id: LoanId,
    pub settlement_date: NaiveDate,
    pub owner_external_id: String,
    pub purchase_price_ratio: String,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuybackCommand {
    pub loan_id: LoanId,
    pub settlement_date: NaiveDate,
    pub external_id: Option<String>,
}

/// Identifiers of the transfer written by a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferCommandResult {
    pub resource_id: TransferId,
    pub resource_external_id: Option<String>,
    pub loan_id: LoanId,
    pub loan_external_id: Option<String>,
}

impl From<&Transfer> for TransferCommandResult {
    fn from(transfer: &Transfer) -> Self {
        let values = transfer.values();
        Self {
            resource_id: values.id,
            resource_external_id: values.external_id.clone(),
            loan_id: values.loan_id,
            loan_external_id: values.external_loan_id.clone(),
        }
    }
}
