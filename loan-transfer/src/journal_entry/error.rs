use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalEntryError {
    #[error("JournalEntryError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JournalEntryError - AccountResolver: {0}")]
    AccountResolver(#[from] crate::accounts::AccountResolverError),
    #[error("JournalEntryError - TransferError: {0}")]
    TransferError(#[from] crate::transfer::error::TransferError),
    #[error("JournalEntryError - ParseCurrency: {0}")]
    ParseCurrency(#[from] crate::primitives::ParseCurrencyError),
    #[error("JournalEntryError - ParseDecimal: {0}")]
    ParseDecimal(#[from] rust_decimal::Error),
    #[error("JournalEntryError - ParseCode: {0}")]
    ParseCode(#[from] strum::ParseError),
}
