//! Resolution of general ledger accounts for transfer postings.
//!
//! Which account a balance component posts to depends on the loan's
//! classification: charged-off loans use the charge-off expense and income
//! accounts (fraud has its own principal account), cash based products have
//! no receivables and use the income accounts instead.

pub mod error;
mod mappings;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{loan::LoanValues, primitives::*};

pub use error::*;
pub use mappings::*;

#[derive(
    Debug,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountPurpose {
    LoanPortfolio,
    InterestReceivable,
    FeesReceivable,
    PenaltiesReceivable,
    Overpayment,
    AssetTransfer,
    InterestOnLoans,
    IncomeFromFees,
    IncomeFromPenalties,
    ChargeOffExpense,
    ChargeOffFraudExpense,
    IncomeFromChargeOffInterest,
    IncomeFromChargeOffFees,
    IncomeFromChargeOffPenalty,
}

/// Outstanding balance components moved by a transfer, in posting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceComponent {
    Principal,
    Interest,
    Fees,
    Penalties,
    Overpayment,
}

impl BalanceComponent {
    pub const ALL: [BalanceComponent; 5] = [
        Self::Principal,
        Self::Interest,
        Self::Fees,
        Self::Penalties,
        Self::Overpayment,
    ];

    pub fn amount(&self, loan: &LoanValues) -> Option<Decimal> {
        match self {
            Self::Principal => loan.summary.principal_outstanding,
            Self::Interest => loan.summary.interest_outstanding,
            Self::Fees => loan.summary.fee_charges_outstanding,
            Self::Penalties => loan.summary.penalty_charges_outstanding,
            Self::Overpayment => loan.total_overpaid,
        }
    }

    pub fn purpose_for(&self, loan: &LoanValues) -> AccountPurpose {
        use AccountPurpose::*;
        match (self, loan.charged_off) {
            (Self::Overpayment, _) => Overpayment,
            (Self::Principal, true) if loan.fraud => ChargeOffFraudExpense,
            (Self::Principal, true) => ChargeOffExpense,
            (Self::Principal, false) => LoanPortfolio,
            (Self::Interest, true) => IncomeFromChargeOffInterest,
            (Self::Fees, true) => IncomeFromChargeOffFees,
            (Self::Penalties, true) => IncomeFromChargeOffPenalty,
            (Self::Interest, false) if loan.accounting.is_cash_based() => InterestOnLoans,
            (Self::Fees, false) if loan.accounting.is_cash_based() => IncomeFromFees,
            (Self::Penalties, false) if loan.accounting.is_cash_based() => IncomeFromPenalties,
            (Self::Interest, false) => InterestReceivable,
            (Self::Fees, false) => FeesReceivable,
            (Self::Penalties, false) => PenaltiesReceivable,
        }
    }
}

/// Maps a loan product and account purpose to the ledger account to post to.
pub trait AccountResolver: Send + Sync {
    fn resolve(
        &self,
        product_id: LoanProductId,
        purpose: AccountPurpose,
    ) -> Result<LedgerAccountId, AccountResolverError>;

    fn resolve_for_component(
        &self,
        loan: &LoanValues,
        component: BalanceComponent,
    ) -> Result<LedgerAccountId, AccountResolverError> {
        self.resolve(loan.product_id, component.purpose_for(loan))
    }

    fn clearing_account(&self, loan: &LoanValues) -> Result<LedgerAccountId, AccountResolverError> {
        self.resolve(loan.product_id, AccountPurpose::AssetTransfer)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::loan::{AccountingRule, LoanStatus, LoanSummary};

    fn loan(charged_off: bool, fraud: bool, accounting: AccountingRule) -> LoanValues {
        LoanValues::builder()
            .id(LoanId::new(1))
            .product_id(LoanProductId::new(1))
            .office_id(OfficeId::new(1))
            .currency("USD".parse().unwrap())
            .status(LoanStatus::Active)
            .charged_off(charged_off)
            .fraud(fraud)
            .accounting(accounting)
            .summary(LoanSummary {
                principal_outstanding: Some(dec!(1)),
                ..Default::default()
            })
            .build()
            .unwrap()
    }

    #[test]
    fn accrual_loan_uses_receivables() {
        let loan = loan(false, false, AccountingRule::AccrualPeriodic);
        assert_eq!(
            BalanceComponent::Principal.purpose_for(&loan),
            AccountPurpose::LoanPortfolio
        );
        assert_eq!(
            BalanceComponent::Interest.purpose_for(&loan),
            AccountPurpose::InterestReceivable
        );
        assert_eq!(
            BalanceComponent::Penalties.purpose_for(&loan),
            AccountPurpose::PenaltiesReceivable
        );
    }

    #[test]
    fn cash_loan_uses_income_accounts() {
        let loan = loan(false, false, AccountingRule::Cash);
        assert_eq!(
            BalanceComponent::Principal.purpose_for(&loan),
            AccountPurpose::LoanPortfolio
        );
        assert_eq!(
            BalanceComponent::Fees.purpose_for(&loan),
            AccountPurpose::IncomeFromFees
        );
    }

    #[test]
    fn charged_off_loan_substitutes_accounts() {
        let regular = loan(true, false, AccountingRule::AccrualPeriodic);
        let fraud = loan(true, true, AccountingRule::AccrualPeriodic);
        assert_eq!(
            BalanceComponent::Principal.purpose_for(&regular),
            AccountPurpose::ChargeOffExpense
        );
        assert_eq!(
            BalanceComponent::Principal.purpose_for(&fraud),
            AccountPurpose::ChargeOffFraudExpense
        );
        assert_eq!(
            BalanceComponent::Interest.purpose_for(&fraud),
            AccountPurpose::IncomeFromChargeOffInterest
        );
        assert_eq!(
            BalanceComponent::Overpayment.purpose_for(&fraud),
            AccountPurpose::Overpayment
        );
    }
}
