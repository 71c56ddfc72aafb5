//! Form validation for customers, consultants, orders and passwords.
//!
//! Inputs are raw form strings. Each validator either returns the parsed
//! value or the per-field messages to show next to the form. Nothing here
//! looks at the clock: order validation takes `today` from the caller.

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{Email, PhoneNumber, Price, ServiceType};

pub const INVALID_EMAIL: &str = "Please enter a valid email.";
pub const INVALID_PHONE: &str = "Phone number must be 10 digits.";
pub const NAME_REQUIRED: &str = "Name is required.";
pub const NO_SERVICES: &str = "At least one service must be added.";
pub const SERVICE_TYPE_REQUIRED: &str = "Service type is required.";
pub const SERVICE_DATE_REQUIRED: &str = "Service date is required.";
pub const SERVICE_DATE_NOT_FUTURE: &str = "Service date must be in the future.";
pub const FROM_ADDRESS_REQUIRED: &str = "From address is required.";
pub const TO_ADDRESS_REQUIRED: &str = "To address is required for moving.";
pub const COMMENT_REQUIRED: &str = "Comments are required.";
pub const PRICE_NOT_POSITIVE: &str = "Price must be greater than zero.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters.";

/// Minimum password length, counted after trimming.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Raw name/email/phone fields shared by customer, consultant and order forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonInput {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Per-field messages for a [`PersonInput`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersonErrors {
    pub name: Option<&'static str>,
    pub email: Option<&'static str>,
    pub phone: Option<&'static str>,
}

impl PersonErrors {
    /// No field has an error.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

/// Validated person fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPerson {
    pub name: String,
    pub email: Email,
    pub phone: PhoneNumber,
}

/// Validate the name/email/phone triple.
///
/// # Errors
///
/// Returns the per-field messages when any field is invalid.
pub fn validate_person(input: &PersonInput) -> Result<ValidPerson, PersonErrors> {
    let name = input.name.trim();
    let email = Email::parse(&input.email);
    let phone = PhoneNumber::parse(&input.phone);

    match (name.is_empty(), email, phone) {
        (false, Ok(email), Ok(phone)) => Ok(ValidPerson {
            name: name.to_owned(),
            email,
            phone,
        }),
        (name_missing, email, phone) => Err(PersonErrors {
            name: name_missing.then_some(NAME_REQUIRED),
            email: email.err().map(|_| INVALID_EMAIL),
            phone: phone.err().map(|_| INVALID_PHONE),
        }),
    }
}

/// Validate the initial password for a new consultant.
///
/// # Errors
///
/// Returns a message when the trimmed password is shorter than
/// [`MIN_PASSWORD_LEN`].
pub fn validate_new_password(password: &str) -> Result<(), &'static str> {
    if password.trim().chars().count() < MIN_PASSWORD_LEN {
        return Err(PASSWORD_TOO_SHORT);
    }
    Ok(())
}

/// Raw password change form.
#[derive(Debug, Clone, Default)]
pub struct PasswordChangeInput {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

/// Validate a password change. Returns the first failing rule's message.
///
/// # Errors
///
/// Returns a message when a field is empty, the new password is too short,
/// equals the current one, or the confirmation does not match.
pub fn validate_password_change(input: &PasswordChangeInput) -> Result<(), &'static str> {
    if input.current.is_empty() || input.new.is_empty() || input.confirm.is_empty() {
        return Err("All fields are required.");
    }
    if input.new.chars().count() < MIN_PASSWORD_LEN {
        return Err("New password must be at least 8 characters.");
    }
    if input.new == input.current {
        return Err("New password must be different from current password.");
    }
    if input.new != input.confirm {
        return Err("Confirmation does not match.");
    }
    Ok(())
}

/// Raw service line fields as posted by the order form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceLineInput {
    /// Service type id (`1`, `2`, `3`) or display name.
    pub service_type: String,
    /// `YYYY-MM-DD`.
    pub service_date: String,
    pub address_from: String,
    pub address_to: String,
    pub comment: String,
    pub price: String,
}

impl ServiceLineInput {
    /// The selected service type, if any.
    #[must_use]
    pub fn parsed_type(&self) -> Option<ServiceType> {
        let raw = self.service_type.trim();
        raw.parse::<i64>()
            .ok()
            .and_then(ServiceType::from_type_id)
            .or_else(|| ServiceType::from_label(raw))
    }

    /// The entered price, if it parses.
    #[must_use]
    pub fn parsed_price(&self) -> Option<Price> {
        self.price.parse().ok()
    }
}

/// A service line that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidServiceLine {
    pub service_type: ServiceType,
    pub service_date: NaiveDate,
    pub address_from: String,
    pub address_to: Option<String>,
    pub comment: String,
    pub price: Price,
}

/// Parse a form date, accepting a trailing time part.
#[must_use]
pub fn parse_service_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Validate one service line. Returns the first failing rule's message.
///
/// # Errors
///
/// Returns a message when any rule fails, checked in form order.
pub fn validate_service_line(
    input: &ServiceLineInput,
    today: NaiveDate,
) -> Result<ValidServiceLine, &'static str> {
    let service_type = input.parsed_type().ok_or(SERVICE_TYPE_REQUIRED)?;

    if input.service_date.trim().is_empty() {
        return Err(SERVICE_DATE_REQUIRED);
    }
    let service_date = parse_service_date(&input.service_date).ok_or(SERVICE_DATE_REQUIRED)?;
    if service_date <= today {
        return Err(SERVICE_DATE_NOT_FUTURE);
    }

    let address_from = input.address_from.trim();
    if address_from.is_empty() {
        return Err(FROM_ADDRESS_REQUIRED);
    }

    let address_to = input.address_to.trim();
    if service_type.needs_destination() && address_to.is_empty() {
        return Err(TO_ADDRESS_REQUIRED);
    }

    let comment = input.comment.trim();
    if comment.is_empty() {
        return Err(COMMENT_REQUIRED);
    }

    let price = input
        .parsed_price()
        .filter(Price::is_positive)
        .ok_or(PRICE_NOT_POSITIVE)?;

    Ok(ValidServiceLine {
        service_type,
        service_date,
        address_from: address_from.to_owned(),
        address_to: (!address_to.is_empty()).then(|| address_to.to_owned()),
        comment: comment.to_owned(),
        price,
    })
}

/// Raw order form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderInput {
    pub customer: PersonInput,
    pub services: Vec<ServiceLineInput>,
}

/// Per-field messages for an [`OrderInput`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderErrors {
    pub customer: PersonErrors,
    /// One entry per service line, `None` when the line is valid.
    pub services: Vec<Option<&'static str>>,
    /// Order-level message, e.g. no service lines at all.
    pub form: Option<&'static str>,
}

impl OrderErrors {
    /// No field has an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.customer.is_empty() && self.form.is_none() && self.services.iter().all(Option::is_none)
    }

    /// Message for the service line at `index`.
    #[must_use]
    pub fn service(&self, index: usize) -> Option<&'static str> {
        self.services.get(index).copied().flatten()
    }
}

/// A fully validated order form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidOrder {
    pub customer: ValidPerson,
    pub services: Vec<ValidServiceLine>,
}

impl ValidOrder {
    /// Sum of all line prices.
    #[must_use]
    pub fn total(&self) -> Price {
        self.services.iter().map(|line| line.price).sum()
    }
}

/// Validate a whole order form.
///
/// # Errors
///
/// Returns every field message when the customer is invalid, any line is
/// invalid, or there are no lines.
pub fn validate_order(input: &OrderInput, today: NaiveDate) -> Result<ValidOrder, OrderErrors> {
    let customer = validate_person(&input.customer);
    let lines: Vec<_> = input
        .services
        .iter()
        .map(|line| validate_service_line(line, today))
        .collect();

    let form = input.services.is_empty().then_some(NO_SERVICES);
    let all_lines_valid = lines.iter().all(Result::is_ok);

    match customer {
        Ok(customer) if form.is_none() && all_lines_valid => Ok(ValidOrder {
            customer,
            services: lines.into_iter().filter_map(Result::ok).collect(),
        }),
        customer => Err(OrderErrors {
            customer: customer.err().unwrap_or_default(),
            services: lines.iter().map(|line| line.as_ref().err().copied()).collect(),
            form,
        }),
    }
}
