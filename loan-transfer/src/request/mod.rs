//! Loosely typed command payloads and their validation into commands.
mod date_format;
mod validation;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    lifecycle::{BuybackCommand, SaleCommand},
    primitives::*,
    transfer::TransferFilter,
};

use date_format::*;
use validation::Validator;
pub use validation::{FieldError, FieldErrorCode, ValidationErrors};

const EXTERNAL_ID_MAX_LENGTH: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub settlement_date: Option<String>,
    pub owner_external_id: Option<String>,
    pub transfer_external_id: Option<String>,
    pub purchase_price_ratio: Option<String>,
    pub date_format: Option<String>,
    pub locale: Option<String>,
}

impl SaleRequest {
    pub fn validate(self, loan_id: LoanId) -> Result<SaleCommand, ValidationErrors> {
        let mut validator = Validator::default();
        let settlement_date = validator.settlement_date(
            self.settlement_date.as_deref(),
            self.date_format.as_deref(),
            self.locale.as_deref(),
        );
        let owner_external_id = validator
            .mandatory("ownerExternalId", self.owner_external_id.as_deref())
            .filter(|v| validator.max_length("ownerExternalId", v, EXTERNAL_ID_MAX_LENGTH))
            .map(str::to_string);
        let external_id = validator.external_id(self.transfer_external_id.as_deref());
        let purchase_price_ratio =
            validator.purchase_price_ratio(self.purchase_price_ratio.as_deref());

        let command = match (settlement_date, owner_external_id, purchase_price_ratio) {
            (Some(settlement_date), Some(owner_external_id), Some(purchase_price_ratio)) => {
                Some(SaleCommand {
                    loan_id,
                    settlement_date,
                    owner_external_id,
                    purchase_price_ratio,
                    external_id,
                })
            }
            _ => None,
        };
        validator.finish(command)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuybackRequest {
    pub settlement_date: Option<String>,
    pub transfer_external_id: Option<String>,
    pub date_format: Option<String>,
    pub locale: Option<String>,
}

impl BuybackRequest {
    pub fn validate(self, loan_id: LoanId) -> Result<BuybackCommand, ValidationErrors> {
        let mut validator = Validator::default();
        let settlement_date = validator.settlement_date(
            self.settlement_date.as_deref(),
            self.date_format.as_deref(),
            self.locale.as_deref(),
        );
        let external_id = validator.external_id(self.transfer_external_id.as_deref());
        let command = settlement_date.map(|settlement_date| BuybackCommand {
            loan_id,
            settlement_date,
            external_id,
        });
        validator.finish(command)
    }
}

/// Query parameters of the transfer search. Exactly one identifier must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSearchRequest {
    pub loan_id: Option<LoanId>,
    pub loan_external_id: Option<String>,
    pub transfer_external_id: Option<String>,
}

impl TransferSearchRequest {
    pub fn validate(self) -> Result<TransferFilter, ValidationErrors> {
        let mut validator = Validator::default();
        let filter = match (
            self.loan_id,
            self.loan_external_id,
            self.transfer_external_id,
        ) {
            (Some(loan_id), None, None) => Some(TransferFilter::LoanId(loan_id)),
            (None, Some(external_id), None) => Some(TransferFilter::ExternalLoanId(external_id)),
            (None, None, Some(external_id)) => Some(TransferFilter::ExternalId(external_id)),
            _ => {
                validator.fail(
                    "transferExternalId",
                    FieldErrorCode::ExactlyOneRequired,
                    "Exactly one of `loanId`, `loanExternalId` or `transferExternalId` must be provided.",
                );
                None
            }
        };
        validator.finish(filter)
    }
}

impl Validator {
    fn settlement_date(
        &mut self,
        value: Option<&str>,
        date_format: Option<&str>,
        locale: Option<&str>,
    ) -> Option<NaiveDate> {
        let value = self.mandatory("settlementDate", value);

        let locale = locale.unwrap_or(DEFAULT_LOCALE);
        if !is_supported_locale(locale) {
            self.fail(
                "locale",
                FieldErrorCode::UnsupportedLocale,
                format!("The parameter `locale` has an unsupported value `{locale}`."),
            );
        }
        let pattern = date_format.unwrap_or(DEFAULT_DATE_FORMAT);
        let chrono_format = to_chrono_format(pattern);
        if chrono_format.is_none() {
            self.fail(
                "dateFormat",
                FieldErrorCode::InvalidDateFormat,
                format!("The parameter `dateFormat` has an unsupported pattern `{pattern}`."),
            );
        }

        let (value, chrono_format) = (value?, chrono_format?);
        let date = parse_date(value, &chrono_format);
        if date.is_none() {
            self.fail(
                "settlementDate",
                FieldErrorCode::InvalidDate,
                format!(
                    "The parameter `settlementDate` is invalid based on the dateFormat: `{pattern}` and locale: `{locale}` provided: {value}"
                ),
            );
        }
        date
    }

    fn external_id(&mut self, value: Option<&str>) -> Option<String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        self.max_length("transferExternalId", value, EXTERNAL_ID_MAX_LENGTH)
            .then(|| value.to_string())
    }

    fn purchase_price_ratio(&mut self, value: Option<&str>) -> Option<String> {
        let value = self.mandatory("purchasePriceRatio", value)?;
        match value.parse::<Decimal>() {
            Ok(ratio) if ratio > Decimal::ZERO => Some(value.to_string()),
            Ok(_) => {
                self.fail(
                    "purchasePriceRatio",
                    FieldErrorCode::NotGreaterThanZero,
                    "The parameter `purchasePriceRatio` must be greater than 0.",
                );
                None
            }
            Err(_) => {
                self.fail(
                    "purchasePriceRatio",
                    FieldErrorCode::InvalidDecimal,
                    format!("The parameter `purchasePriceRatio` is not a valid decimal: {value}"),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale_request() -> SaleRequest {
        SaleRequest {
            settlement_date: Some("2024-03-05".to_string()),
            owner_external_id: Some("owner-1".to_string()),
            transfer_external_id: Some("transfer-1".to_string()),
            purchase_price_ratio: Some("1.05".to_string()),
            date_format: None,
            locale: None,
        }
    }

    #[test]
    fn valid_sale_request() {
        let command = sale_request().validate(LoanId::new(7)).unwrap();
        assert_eq!(command.loan_id, LoanId::new(7));
        assert_eq!(
            command.settlement_date,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert_eq!(command.owner_external_id, "owner-1");
        assert_eq!(command.purchase_price_ratio, "1.05");
        assert_eq!(command.external_id.as_deref(), Some("transfer-1"));
    }

    #[test]
    fn sale_request_from_json() {
        let request: SaleRequest = serde_json::from_str(
            r#"{
                "settlementDate": "05 March 2024",
                "ownerExternalId": "owner-1",
                "purchasePriceRatio": "1",
                "dateFormat": "dd MMMM yyyy",
                "locale": "en"
            }"#,
        )
        .unwrap();
        let command = request.validate(LoanId::new(1)).unwrap();
        assert_eq!(
            command.settlement_date,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert_eq!(command.external_id, None);
    }

    #[test]
    fn sale_request_collects_all_errors() {
        let request = SaleRequest {
            settlement_date: None,
            owner_external_id: Some(" ".to_string()),
            transfer_external_id: Some("x".repeat(101)),
            purchase_price_ratio: Some("abc".to_string()),
            ..Default::default()
        };
        let errors = request.validate(LoanId::new(1)).unwrap_err();
        assert_eq!(errors.errors().len(), 4);
        assert!(errors.has_error("settlementDate", FieldErrorCode::Mandatory));
        assert!(errors.has_error("ownerExternalId", FieldErrorCode::Mandatory));
        assert!(errors.has_error("transferExternalId", FieldErrorCode::ExceedsMaxLength));
        assert!(errors.has_error("purchasePriceRatio", FieldErrorCode::InvalidDecimal));
    }

    #[test]
    fn unparsable_settlement_date() {
        let request = SaleRequest {
            settlement_date: Some("05/03/2024".to_string()),
            ..sale_request()
        };
        let errors = request.validate(LoanId::new(1)).unwrap_err();
        assert!(errors.has_error("settlementDate", FieldErrorCode::InvalidDate));
    }

    #[test]
    fn non_positive_ratio() {
        let request = SaleRequest {
            purchase_price_ratio: Some("0".to_string()),
            ..sale_request()
        };
        let errors = request.validate(LoanId::new(1)).unwrap_err();
        assert!(errors.has_error("purchasePriceRatio", FieldErrorCode::NotGreaterThanZero));
    }

    #[test]
    fn buyback_request() {
        let request = BuybackRequest {
            settlement_date: Some("2024-03-05".to_string()),
            locale: Some("fr".to_string()),
            ..Default::default()
        };
        let errors = request.clone().validate(LoanId::new(1)).unwrap_err();
        assert!(errors.has_error("locale", FieldErrorCode::UnsupportedLocale));

        let command = BuybackRequest {
            locale: None,
            ..request
        }
        .validate(LoanId::new(1))
        .unwrap();
        assert_eq!(command.external_id, None);
    }

    #[test]
    fn search_needs_exactly_one_identifier() {
        let filter = TransferSearchRequest {
            loan_external_id: Some("loan-1".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(filter, TransferFilter::ExternalLoanId("loan-1".to_string()));

        assert!(TransferSearchRequest::default().validate().is_err());
        assert!(TransferSearchRequest {
            loan_id: Some(LoanId::new(1)),
            transfer_external_id: Some("t".to_string()),
            ..Default::default()
        }
        .validate()
        .is_err());
    }
}
