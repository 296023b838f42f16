use chrono::NaiveDate;
use derive_builder::Builder;
use rust_decimal::Decimal;

pub use transfer_types::transfer::*;

use super::error::TransferError;
use crate::{loan::LoanValues, primitives::*};

/// A row of the transfer log. Rows are never rewritten; the only change a
/// stored transfer accepts is closing its validity window.
#[derive(Debug, Clone)]
pub struct Transfer {
    values: TransferValues,
}

impl Transfer {
    pub fn id(&self) -> TransferId {
        self.values.id
    }

    pub fn status(&self) -> TransferStatus {
        self.values.status
    }

    pub fn sub_status(&self) -> Option<TransferSubStatus> {
        self.values.sub_status
    }

    pub fn loan_id(&self) -> LoanId {
        self.values.loan_id
    }

    pub fn owner_id(&self) -> OwnerId {
        self.values.owner_id
    }

    pub fn external_id(&self) -> Option<&str> {
        self.values.external_id.as_deref()
    }

    pub fn settlement_date(&self) -> NaiveDate {
        self.values.settlement_date
    }

    pub fn is_open(&self) -> bool {
        self.values.is_open()
    }

    pub fn values(&self) -> &TransferValues {
        &self.values
    }

    pub fn into_values(self) -> TransferValues {
        self.values
    }

    pub(super) fn close(
        &mut self,
        on: NaiveDate,
        details: Option<TransferDetails>,
    ) -> Result<(), TransferError> {
        if !self.is_open() {
            return Err(TransferError::AlreadyClosed(self.id()));
        }
        self.values.effective_date_to = on;
        if details.is_some() {
            self.values.details = details;
        }
        Ok(())
    }
}

impl From<TransferValues> for Transfer {
    fn from(values: TransferValues) -> Self {
        Self { values }
    }
}

#[derive(Builder, Debug, Clone)]
#[builder(pattern = "owned", build_fn(error = "TransferError"))]
pub struct NewTransfer {
    #[builder(setter(into))]
    pub(super) owner_id: OwnerId,
    #[builder(setter(into))]
    pub(super) owner_external_id: String,
    #[builder(default)]
    pub(super) external_id: Option<String>,
    pub(super) status: TransferStatus,
    #[builder(setter(strip_option), default)]
    pub(super) sub_status: Option<TransferSubStatus>,
    #[builder(setter(into))]
    pub(super) loan_id: LoanId,
    #[builder(default)]
    pub(super) external_loan_id: Option<String>,
    pub(super) settlement_date: NaiveDate,
    pub(super) effective_date_from: NaiveDate,
    #[builder(default = "open_effective_date()")]
    pub(super) effective_date_to: NaiveDate,
    #[builder(setter(into))]
    pub(super) purchase_price_ratio: String,
    #[builder(setter(strip_option), default)]
    pub(super) details: Option<NewTransferDetails>,
}

impl NewTransfer {
    pub fn builder() -> NewTransferBuilder {
        NewTransferBuilder::default()
    }

    /// Starts a row that continues the thread of `transfer`: same owner,
    /// loan, external ids, settlement date and purchase price ratio.
    pub fn successor_of(transfer: &Transfer) -> NewTransferBuilder {
        let values = transfer.values();
        NewTransferBuilder::default()
            .owner_id(values.owner_id)
            .owner_external_id(values.owner_external_id.clone())
            .external_id(values.external_id.clone())
            .loan_id(values.loan_id)
            .external_loan_id(values.external_loan_id.clone())
            .settlement_date(values.settlement_date)
            .purchase_price_ratio(values.purchase_price_ratio.clone())
    }
}

/// Balance snapshot to persist alongside a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransferDetails {
    pub(super) total_outstanding: Decimal,
    pub(super) principal_outstanding: Decimal,
    pub(super) interest_outstanding: Decimal,
    pub(super) fee_charges_outstanding: Decimal,
    pub(super) penalty_charges_outstanding: Decimal,
    pub(super) total_overpaid: Decimal,
}

impl NewTransferDetails {
    pub(super) fn into_details(self, id: TransferDetailsId) -> TransferDetails {
        TransferDetails {
            id,
            total_outstanding: self.total_outstanding,
            principal_outstanding: self.principal_outstanding,
            interest_outstanding: self.interest_outstanding,
            fee_charges_outstanding: self.fee_charges_outstanding,
            penalty_charges_outstanding: self.penalty_charges_outstanding,
            total_overpaid: self.total_overpaid,
        }
    }
}

impl From<&LoanValues> for NewTransferDetails {
    fn from(loan: &LoanValues) -> Self {
        let summary = &loan.summary;
        Self {
            total_outstanding: loan.total_outstanding(),
            principal_outstanding: summary.principal_outstanding.unwrap_or_default(),
            interest_outstanding: summary.interest_outstanding.unwrap_or_default(),
            fee_charges_outstanding: summary.fee_charges_outstanding.unwrap_or_default(),
            penalty_charges_outstanding: summary.penalty_charges_outstanding.unwrap_or_default(),
            total_overpaid: loan.overpaid_amount(),
        }
    }
}

/// Open transfers of a loan in one of a given set of statuses, ascending by
/// id. Never holds more than two rows.
#[derive(Debug, Clone)]
pub struct EffectiveTransfers {
    transfers: Vec<Transfer>,
}

impl EffectiveTransfers {
    pub(super) fn try_new(loan_id: LoanId, transfers: Vec<Transfer>) -> Result<Self, TransferError> {
        if transfers.len() > 2 {
            return Err(TransferError::TooManyEffectiveTransfers {
                loan_id,
                count: transfers.len(),
            });
        }
        Ok(Self { transfers })
    }

    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    pub fn latest(&self) -> Option<&Transfer> {
        self.transfers.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter()
    }

    pub fn into_inner(self) -> Vec<Transfer> {
        self.transfers
    }
}
