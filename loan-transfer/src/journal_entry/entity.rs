use chrono::NaiveDate;
use rust_decimal::Decimal;

pub use transfer_types::journal_entry::*;

use crate::primitives::*;

/// A posting that has been computed but not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJournalEntry {
    pub office_id: OfficeId,
    pub currency: Currency,
    pub account_id: LedgerAccountId,
    pub loan_id: LoanId,
    pub transaction_id: String,
    pub direction: DebitOrCredit,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub submitted_on_date: NaiveDate,
}
