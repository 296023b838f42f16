use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldErrorCode {
    Mandatory,
    InvalidDate,
    InvalidDateFormat,
    InvalidDecimal,
    NotGreaterThanZero,
    ExceedsMaxLength,
    UnsupportedLocale,
    ExactlyOneRequired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub parameter: &'static str,
    pub code: FieldErrorCode,
    pub message: String,
}

/// All field errors found in one request.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Validation errors exist: {}", describe(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn has_error(&self, parameter: &str, code: FieldErrorCode) -> bool {
        self.0
            .iter()
            .any(|e| e.parameter == parameter && e.code == code)
    }
}

#[derive(Default)]
pub(super) struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub(super) fn fail(
        &mut self,
        parameter: &'static str,
        code: FieldErrorCode,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError {
            parameter,
            code,
            message: message.into(),
        });
    }

    pub(super) fn mandatory<'a>(
        &mut self,
        parameter: &'static str,
        value: Option<&'a str>,
    ) -> Option<&'a str> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => Some(v),
            None => {
                self.fail(
                    parameter,
                    FieldErrorCode::Mandatory,
                    format!("The parameter `{parameter}` is mandatory."),
                );
                None
            }
        }
    }

    pub(super) fn max_length(&mut self, parameter: &'static str, value: &str, max: usize) -> bool {
        if value.chars().count() > max {
            self.fail(
                parameter,
                FieldErrorCode::ExceedsMaxLength,
                format!("The parameter `{parameter}` exceeds max length of {max}."),
            );
            return false;
        }
        true
    }

    pub(super) fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(ValidationErrors(self.errors)),
        }
    }
}
