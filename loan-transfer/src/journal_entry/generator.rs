use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::entity::NewJournalEntry;
use crate::{
    accounts::{AccountResolver, AccountResolverError, BalanceComponent},
    loan::LoanValues,
    primitives::*,
    transfer::TransferValues,
};

pub fn transfer_transaction_id(transfer_id: TransferId) -> String {
    format!("asset-transfer-{transfer_id}")
}

/// Amounts per account in the order accounts were first seen.
#[derive(Default)]
struct AccountTotals(Vec<(LedgerAccountId, Decimal)>);

impl AccountTotals {
    fn add(&mut self, account_id: LedgerAccountId, amount: Decimal) {
        match self.0.iter_mut().find(|(id, _)| *id == account_id) {
            Some((_, total)) => *total += amount,
            None => self.0.push((account_id, amount)),
        }
    }

    fn total(&self) -> Decimal {
        self.0.iter().map(|(_, amount)| *amount).sum()
    }
}

/// Postings moving the loan's outstanding balances against the asset
/// transfer clearing account. Balance accounts are credited and the
/// clearing account is debited for the total; `reversed` swaps the sides.
pub(super) fn transfer_entries(
    resolver: &dyn AccountResolver,
    loan: &LoanValues,
    transfer: &TransferValues,
    reversed: bool,
    date: NaiveDate,
) -> Result<Vec<NewJournalEntry>, AccountResolverError> {
    let mut totals = AccountTotals::default();
    for component in BalanceComponent::ALL {
        if let Some(amount) = component.amount(loan).filter(|a| *a > Decimal::ZERO) {
            totals.add(resolver.resolve_for_component(loan, component)?, amount);
        }
    }

    let total = totals.total();
    if total <= Decimal::ZERO {
        return Ok(Vec::new());
    }

    let (balance_side, clearing_side) = if reversed {
        (DebitOrCredit::Debit, DebitOrCredit::Credit)
    } else {
        (DebitOrCredit::Credit, DebitOrCredit::Debit)
    };
    let transaction_id = transfer_transaction_id(transfer.id);
    let entry = |account_id, direction, amount| NewJournalEntry {
        office_id: loan.office_id,
        currency: loan.currency,
        account_id,
        loan_id: loan.id,
        transaction_id: transaction_id.clone(),
        direction,
        amount,
        transaction_date: date,
        submitted_on_date: date,
    };

    let mut entries: Vec<_> = totals
        .0
        .into_iter()
        .map(|(account_id, amount)| entry(account_id, balance_side, amount))
        .collect();
    entries.push(entry(resolver.clearing_account(loan)?, clearing_side, total));
    Ok(entries)
}
