use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryValues {
    pub id: JournalEntryId,
    pub office_id: OfficeId,
    pub currency: Currency,
    pub account_id: LedgerAccountId,
    pub loan_id: Option<LoanId>,
    pub transaction_id: String,
    pub direction: DebitOrCredit,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub submitted_on_date: NaiveDate,
    pub reversed: bool,
}
