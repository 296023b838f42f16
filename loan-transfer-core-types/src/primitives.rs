use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

crate::entity_id! { TransferId }
crate::entity_id! { TransferDetailsId }
crate::entity_id! { OwnerId }
crate::entity_id! { LoanId }
crate::entity_id! { LoanProductId }
crate::entity_id! { OfficeId }
crate::entity_id! { JournalEntryId }
crate::entity_id! { LedgerAccountId }

/// `effective_date_to` value of a row that is still in force.
pub fn open_effective_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
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
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DebitOrCredit {
    Debit,
    Credit,
}

#[derive(Clone, Copy)]
pub struct Currency(&'static rusty_money::iso::Currency);

impl Currency {
    pub fn code(&self) -> &'static str {
        self.0.iso_alpha_code
    }
}

#[derive(thiserror::Error, Debug)]
#[error("ParseCurrencyError - Unknown currency code: {0}")]
pub struct ParseCurrencyError(String);

impl std::str::FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        rusty_money::iso::find(&s.to_uppercase())
            .map(Currency)
            .ok_or_else(|| ParseCurrencyError(s.to_string()))
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::fmt::Debug for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

impl PartialEq for Currency {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for Currency {}

impl std::hash::Hash for Currency {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl Serialize for Currency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}
