use chrono::NaiveDate;
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
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Active,
    Buyback,
    Cancelled,
    Declined,
}

impl TransferStatus {
    /// Statuses that make a row part of a loan's effective set while open.
    pub const EFFECTIVE: [TransferStatus; 3] = [Self::Pending, Self::Active, Self::Buyback];
    /// Open intents that still wait to be executed.
    pub const INTENTS: [TransferStatus; 2] = [Self::Pending, Self::Buyback];

    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Buyback)
    }
}

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
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferSubStatus {
    UserRequested,
    BalanceNegative,
    BalanceZero,
    SamedayTransfers,
    Unsold,
}

/// Balance snapshot taken when a transfer is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDetails {
    pub id: TransferDetailsId,
    pub total_outstanding: Decimal,
    pub principal_outstanding: Decimal,
    pub interest_outstanding: Decimal,
    pub fee_charges_outstanding: Decimal,
    pub penalty_charges_outstanding: Decimal,
    pub total_overpaid: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferValues {
    pub id: TransferId,
    pub owner_id: OwnerId,
    pub owner_external_id: String,
    pub external_id: Option<String>,
    pub status: TransferStatus,
    pub sub_status: Option<TransferSubStatus>,
    pub loan_id: LoanId,
    pub external_loan_id: Option<String>,
    pub settlement_date: NaiveDate,
    pub effective_date_from: NaiveDate,
    pub effective_date_to: NaiveDate,
    pub purchase_price_ratio: String,
    pub details: Option<TransferDetails>,
}

impl TransferValues {
    pub fn is_open(&self) -> bool {
        self.effective_date_to == open_effective_date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_through_text() {
        assert_eq!(TransferStatus::Buyback.as_ref(), "BUYBACK");
        assert_eq!(
            "DECLINED".parse::<TransferStatus>().unwrap(),
            TransferStatus::Declined
        );
        assert_eq!(
            TransferSubStatus::SamedayTransfers.to_string(),
            "SAMEDAY_TRANSFERS"
        );
        assert!("UNKNOWN".parse::<TransferStatus>().is_err());
    }

    #[test]
    fn only_intents_are_cancellable() {
        assert!(TransferStatus::Pending.is_cancellable());
        assert!(TransferStatus::Buyback.is_cancellable());
        assert!(!TransferStatus::Active.is_cancellable());
        assert!(!TransferStatus::Cancelled.is_cancellable());
    }
}
