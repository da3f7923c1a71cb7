use crate::domain::contact::{is_valid_email, is_valid_phone};
use crate::domain::order::Customer;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FirstName,
    LastName,
    BirthDate,
    PassportNumber,
    Citizenship,
    Phone,
    Email,
    City,
    PeriodStart,
    PeriodEnd,
    PaymentOption,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Field::FirstName => "first name",
            Field::LastName => "last name",
            Field::BirthDate => "birth date",
            Field::PassportNumber => "passport number",
            Field::Citizenship => "citizenship",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::City => "city",
            Field::PeriodStart => "period start",
            Field::PeriodEnd => "period end",
            Field::PaymentOption => "payment option",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Problem {
    Missing,
    Malformed,
    BeforeStart,
    #[serde(rename_all = "camelCase")]
    TooShort { min_days: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub problem: Problem,
}

impl FieldError {
    pub fn new(field: Field, problem: Problem) -> Self {
        Self { field, problem }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.problem {
            Problem::Missing => write!(f, "{} is required", self.field),
            Problem::Malformed => write!(f, "{} is malformed", self.field),
            Problem::BeforeStart => write!(f, "{} is before the period start", self.field),
            Problem::TooShort { min_days } => {
                write!(f, "{} must be at least {min_days} days after the start, inclusive", self.field)
            }
        }
    }
}

pub(crate) fn require(errors: &mut Vec<FieldError>, field: Field, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, Problem::Missing));
        false
    } else {
        true
    }
}

/// Checks the text fields shared by the wizard form and the submission gateway.
#[allow(clippy::too_many_arguments)]
pub fn check_contact_fields(
    errors: &mut Vec<FieldError>,
    first_name: &str,
    last_name: &str,
    passport_number: &str,
    citizenship: &str,
    phone: &str,
    email: &str,
    city: &str,
) {
    require(errors, Field::FirstName, first_name);
    require(errors, Field::LastName, last_name);
    require(errors, Field::PassportNumber, passport_number);
    require(errors, Field::Citizenship, citizenship);
    require(errors, Field::City, city);
    if require(errors, Field::Phone, phone) && !is_valid_phone(phone) {
        errors.push(FieldError::new(Field::Phone, Problem::Malformed));
    }
    if require(errors, Field::Email, email) && !is_valid_email(email) {
        errors.push(FieldError::new(Field::Email, Problem::Malformed));
    }
}

pub fn check_customer(customer: &Customer) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_contact_fields(
        &mut errors,
        &customer.first_name,
        &customer.last_name,
        &customer.passport_number,
        &customer.citizenship,
        &customer.phone,
        &customer.email,
        &customer.city,
    );
    errors
}
