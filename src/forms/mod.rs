//! Form validation for everything clients submit.
//!
//! Validators return a [`FieldErrors`] map keyed by the camelCase field name;
//! an empty map means the form is valid.

mod wizard;

pub use wizard::*;

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{AppError, FieldErrors};
use crate::models::{BrandForm, SendMessageRequest, UpdateBrandRequest};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

/// Loose email shape check: something, `@`, something, `.`, something.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Adds `message` under `field` unless the field already carries an error.
pub(crate) fn reject(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_insert_with(|| message.to_string());
}

/// Turns a non-empty error map into an error.
pub fn into_result(errors: FieldErrors) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidFields(errors))
    }
}

/// Contact form: name, email and message are mandatory.
pub fn validate_contact(request: &SendMessageRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if request.listing_id <= 0 {
        reject(&mut errors, "listingId", "Listing reference is invalid");
    }
    if request.sender_name.trim().is_empty() {
        reject(&mut errors, "senderName", "Name is required");
    }
    let email = request.sender_email.trim();
    if email.is_empty() {
        reject(&mut errors, "senderEmail", "Email is required");
    } else if !is_valid_email(email) {
        reject(&mut errors, "senderEmail", "Invalid email format");
    }
    if request.message.trim().is_empty() {
        reject(&mut errors, "message", "Message is required");
    }

    errors
}

/// Earliest founding year accepted for a brand.
const MIN_FOUNDED_YEAR: i32 = 1800;

/// Brand form: name and country are mandatory, founding year must be plausible.
pub fn validate_brand(form: &BrandForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if form.name.trim().is_empty() {
        reject(&mut errors, "name", "Brand name is required");
    }
    if form.country.trim().is_empty() {
        reject(&mut errors, "country", "Country is required");
    }
    if let Some(year) = form.founded_year {
        check_founded_year(&mut errors, year);
    }

    errors
}

/// Brand edits: provided name and country must not be blank.
pub fn validate_brand_update(request: &UpdateBrandRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if matches!(&request.name, Some(name) if name.trim().is_empty()) {
        reject(&mut errors, "name", "Brand name is required");
    }
    if matches!(&request.country, Some(country) if country.trim().is_empty()) {
        reject(&mut errors, "country", "Country is required");
    }
    if let Some(Some(year)) = request.founded_year {
        check_founded_year(&mut errors, year);
    }

    errors
}

pub(crate) fn check_founded_year(errors: &mut FieldErrors, year: i32) {
    let current = Utc::now().year();
    if !(MIN_FOUNDED_YEAR..=current).contains(&year) {
        reject(
            errors,
            "foundedYear",
            &format!("Founded year must be between {} and {}", MIN_FOUNDED_YEAR, current),
        );
    }
}
