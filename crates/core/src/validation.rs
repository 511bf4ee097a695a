use email_address::{EmailAddress, Options};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::types::CaseStatus;

pub const NAME_MAX_LEN: usize = 255;
pub const PHONE_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 255;
pub const INVOICE_NUMBER_MAX_LEN: usize = 100;

/// Fractional digits kept for invoice amounts.
pub const AMOUNT_SCALE: u32 = 2;
/// Integer digits allowed for invoice amounts (15 significant digits overall).
pub const AMOUNT_INTEGER_DIGITS: u32 = 13;

/// Input rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new<S: Into<String>>(field: &'static str, message: S) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Checks that `value` holds between 1 and `max` characters.
pub fn bounded_text(
    field: &'static str,
    value: String,
    max: usize,
) -> Result<String, ValidationError> {
    let len = value.chars().count();
    if len == 0 {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if len > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters long"),
        ));
    }
    Ok(value)
}

/// Validates a bare email address and lower-cases its domain part.
///
/// Display names (`Jane <jane@acme.test>`), domain literals and single-label
/// domains are rejected so that one mailbox maps to one stored value.
pub fn email(value: String) -> Result<String, ValidationError> {
    const FIELD: &str = "email";

    if value.chars().count() > EMAIL_MAX_LEN {
        return Err(ValidationError::new(
            FIELD,
            format!("must be at most {EMAIL_MAX_LEN} characters long"),
        ));
    }

    let options = Options {
        minimum_sub_domains: 2,
        allow_domain_literal: false,
        allow_display_text: false,
    };
    let address = EmailAddress::parse_with_options(&value, options)
        .map_err(|err| ValidationError::new(FIELD, format!("is not a valid email address: {err}")))?;

    Ok(format!(
        "{}@{}",
        address.local_part(),
        address.domain().to_ascii_lowercase()
    ))
}

/// Normalizes an invoice amount to two decimals and checks it is positive.
pub fn invoice_amount(value: Decimal) -> Result<Decimal, ValidationError> {
    const FIELD: &str = "invoice_amount";

    if value <= Decimal::ZERO {
        return Err(ValidationError::new(FIELD, "must be greater than 0"));
    }

    let rounded = value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded <= Decimal::ZERO {
        return Err(ValidationError::new(
            FIELD,
            "must be at least 0.01 once rounded to cents",
        ));
    }

    let limit = Decimal::from(10_i64.pow(AMOUNT_INTEGER_DIGITS));
    if rounded >= limit {
        return Err(ValidationError::new(
            FIELD,
            format!("must have at most {AMOUNT_INTEGER_DIGITS} integer digits"),
        ));
    }

    Ok(rounded)
}

pub fn status(value: &str) -> Result<CaseStatus, ValidationError> {
    value
        .parse()
        .map_err(|err: crate::types::UnknownStatus| ValidationError::new("status", err.to_string()))
}

pub fn positive_id(field: &'static str, value: i64) -> Result<i64, ValidationError> {
    if value <= 0 {
        return Err(ValidationError::new(field, "must be greater than 0"));
    }
    Ok(value)
}
