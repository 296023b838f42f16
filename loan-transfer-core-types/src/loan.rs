use derive_builder::Builder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

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
pub enum LoanStatus {
    SubmittedAndPendingApproval,
    Approved,
    Active,
    TransferInProgress,
    TransferOnHold,
    WithdrawnByClient,
    Rejected,
    ClosedObligationsMet,
    ClosedWrittenOff,
    ClosedRescheduleOutstandingAmount,
    Overpaid,
}

impl LoanStatus {
    pub fn allows_sale(&self) -> bool {
        matches!(
            self,
            Self::Active | Self::TransferInProgress | Self::TransferOnHold
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            Self::ClosedObligationsMet
                | Self::ClosedWrittenOff
                | Self::ClosedRescheduleOutstandingAmount
        )
    }

    pub fn is_overpaid(&self) -> bool {
        matches!(self, Self::Overpaid)
    }
}

#[derive(
    Debug,
    Default,
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
pub enum AccountingRule {
    None,
    Cash,
    #[default]
    AccrualPeriodic,
    AccrualUpfront,
}

impl AccountingRule {
    pub fn is_cash_based(&self) -> bool {
        matches!(self, Self::Cash)
    }
}

/// Outstanding balances as reported by the loan. Unset values count as zero.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub principal_outstanding: Option<Decimal>,
    pub interest_outstanding: Option<Decimal>,
    pub fee_charges_outstanding: Option<Decimal>,
    pub penalty_charges_outstanding: Option<Decimal>,
}

impl LoanSummary {
    pub fn total_outstanding(&self) -> Decimal {
        [
            self.principal_outstanding,
            self.interest_outstanding,
            self.fee_charges_outstanding,
            self.penalty_charges_outstanding,
        ]
        .into_iter()
        .flatten()
        .sum()
    }
}

#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanValues {
    #[builder(setter(into))]
    pub id: LoanId,
    #[builder(setter(into, strip_option), default)]
    pub external_id: Option<String>,
    #[builder(setter(into))]
    pub product_id: LoanProductId,
    #[builder(setter(into))]
    pub office_id: OfficeId,
    pub currency: Currency,
    pub status: LoanStatus,
    #[builder(default)]
    #[serde(default)]
    pub accounting: AccountingRule,
    #[builder(default)]
    #[serde(default)]
    pub charged_off: bool,
    #[builder(default)]
    #[serde(default)]
    pub fraud: bool,
    #[builder(default)]
    #[serde(default)]
    pub summary: LoanSummary,
    #[builder(setter(strip_option), default)]
    pub total_overpaid: Option<Decimal>,
}

impl LoanValues {
    pub fn builder() -> LoanValuesBuilder {
        LoanValuesBuilder::default()
    }

    pub fn total_outstanding(&self) -> Decimal {
        self.summary.total_outstanding()
    }

    pub fn overpaid_amount(&self) -> Decimal {
        self.total_overpaid.unwrap_or_default()
    }

    pub fn is_overpaid(&self) -> bool {
        self.overpaid_amount() > Decimal::ZERO
    }
}
