#![forbid(unsafe_code)]

use std::sync::LazyLock;

use phonenumber::metadata::DATABASE;
use phonenumber::PhoneNumber;
use regex::Regex;

use crate::common::ContactField;
use crate::contact::ContactFields;

/// Escape value accepted verbatim in the email column.
pub const EMAIL_ESCAPE_VALUE: &str = "others";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:(?:[^<>()\[\]\\.,;:\s@"]+(?:\.[^<>()\[\]\\.,;:\s@"]+)*|".+")@(?:[a-z\d-]+\.)+[a-z]{2,}|others)$"#,
    )
    .expect("email pattern is a valid regex")
});

static PHONE_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4,12}$").expect("phone pattern is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("either phone number, email or address is required")]
    MissingContactMethod,
    #[error("not a valid email address: {0}")]
    InvalidEmail(String),
    #[error("not a valid phone number: {0}")]
    InvalidPhone(String),
}

impl ValidationError {
    /// The field the failure is attributed to, if it concerns a single field.
    pub fn field(&self) -> Option<ContactField> {
        match self {
            ValidationError::EmptyName => Some(ContactField::Name),
            ValidationError::MissingContactMethod => None,
            ValidationError::InvalidEmail(_) => Some(ContactField::Email),
            ValidationError::InvalidPhone(_) => Some(ContactField::PhoneNo),
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for ContactFields {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let phone_no = non_blank(self.phone_no.as_deref());
        let email = non_blank(self.email.as_deref());
        let address = non_blank(self.address.as_deref());
        if phone_no.is_none() && email.is_none() && address.is_none() {
            return Err(ValidationError::MissingContactMethod);
        }
        if let Some(email) = email {
            if !is_valid_email(email) {
                return Err(ValidationError::InvalidEmail(email.to_string()));
            }
        }
        if let Some(phone_no) = phone_no {
            if !is_plausible_phone(phone_no) {
                return Err(ValidationError::InvalidPhone(phone_no.to_string()));
            }
        }
        Ok(())
    }
}

/// Accepts or rejects a candidate record. Pure: the candidate is handed back untouched.
pub fn validate(candidate: ContactFields) -> Result<ContactFields, ValidationError> {
    candidate.validate()?;
    Ok(candidate)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Strict parse under international numbering rules first. A parsed number whose
/// national part has a length the calling code allows is accepted even when its
/// digits match no known range. Informal or partial numbers the parser rejects
/// still pass when they are 4 to 12 ASCII digits.
pub fn is_plausible_phone(phone_no: &str) -> bool {
    let phone_no = phone_no.trim();
    match phonenumber::parse(None, phone_no) {
        Ok(number) => {
            number.is_valid() || is_possible_length(&number) || PHONE_DIGITS_RE.is_match(phone_no)
        }
        Err(_) => PHONE_DIGITS_RE.is_match(phone_no),
    }
}

fn is_possible_length(number: &PhoneNumber) -> bool {
    // Display keeps the national leading zeros.
    let digits = number.national().to_string().len();
    let Some(regions) = DATABASE.by_code(&number.code().value()) else {
        return false;
    };
    regions.iter().any(|meta| {
        let general = meta.descriptors().general();
        general
            .possible_length()
            .iter()
            .chain(general.possible_local_length())
            .any(|&len| usize::from(len) == digits)
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
