//! The four-step listing posting wizard.
//!
//! Clients fill a flat [`ListingDraft`] across the steps and may ask the
//! server to check each step before moving on. Submission re-validates every
//! step and converts the draft into a typed [`NewListing`].

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::{into_result, is_valid_email, reject};
use crate::errors::{AppError, FieldErrors};
use crate::models::{
    Condition, FuelType, NewListing, SellerContact, Specifications, Transmission,
    UpdateListingRequest,
};

/// Oldest model year accepted.
const MIN_YEAR: i32 = 1900;

/// One page of the wizard.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct WizardStep {
    pub id: u8,
    pub title: &'static str,
}

pub const WIZARD_STEPS: [WizardStep; 4] = [
    WizardStep { id: 1, title: "Basic information" },
    WizardStep { id: 2, title: "Specifications" },
    WizardStep { id: 3, title: "Photos" },
    WizardStep { id: 4, title: "Contact" },
];

/// Raw form state as the client holds it. Select inputs arrive as strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingDraft {
    // Basic info
    pub title: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i32>,
    pub price: Option<f64>,
    pub condition: String,
    pub description: String,

    // Specifications
    pub engine_power: Option<i32>,
    pub cutting_width: Option<i32>,
    pub fuel_type: String,
    pub transmission: String,
    pub deck_type: String,
    pub wheel_drive: String,

    // Photos
    pub images: Vec<String>,

    // Location and contact
    pub location: String,
    pub distance: Option<f64>,
    pub seller_name: String,
    pub seller_email: String,
    pub seller_phone: String,
}

impl ListingDraft {
    /// Field errors for a single step. Unknown steps are rejected.
    pub fn validate_step(&self, step: u8) -> Result<FieldErrors, AppError> {
        let mut errors = FieldErrors::new();
        match step {
            1 => self.check_basic_info(&mut errors),
            2 => self.check_specifications(&mut errors),
            3 => self.check_photos(&mut errors),
            4 => self.check_contact(&mut errors),
            other => {
                return Err(AppError::BadRequest(format!(
                    "Unknown wizard step {}; expected 1 to {}",
                    other,
                    WIZARD_STEPS.len()
                )))
            }
        }
        Ok(errors)
    }

    /// Field errors across every step.
    pub fn validate_all(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        self.check_basic_info(&mut errors);
        self.check_specifications(&mut errors);
        self.check_photos(&mut errors);
        self.check_contact(&mut errors);
        errors
    }

    /// Validate the whole draft and build the listing to store.
    pub fn into_new_listing(self) -> Result<NewListing, AppError> {
        into_result(self.validate_all())?;

        // Validation guarantees the required values are present and parse.
        let (Some(year), Some(price), Some(condition)) =
            (self.year, self.price, Condition::parse(&self.condition))
        else {
            return Err(AppError::Internal(
                "Draft passed validation with missing basic info".to_string(),
            ));
        };

        Ok(NewListing {
            title: self.title.trim().to_string(),
            brand: self.brand.trim().to_string(),
            model: self.model.trim().to_string(),
            year,
            price,
            condition,
            location: self.location.trim().to_string(),
            distance: self.distance.unwrap_or(0.0),
            images: self.images.iter().map(|i| i.trim().to_string()).collect(),
            description: self.description.trim().to_string(),
            specifications: Specifications {
                engine_power: self.engine_power,
                cutting_width: self.cutting_width,
                fuel_type: FuelType::parse(&self.fuel_type),
                transmission: Transmission::parse(&self.transmission),
                deck_type: non_empty(&self.deck_type),
                wheel_drive: non_empty(&self.wheel_drive),
            },
            seller_contact: SellerContact {
                name: self.seller_name.trim().to_string(),
                phone: non_empty(&self.seller_phone),
                email: self.seller_email.trim().to_string(),
            },
            featured: false,
        })
    }

    fn check_basic_info(&self, errors: &mut FieldErrors) {
        if self.title.trim().is_empty() {
            reject(errors, "title", "Title is required");
        }
        if self.brand.trim().is_empty() {
            reject(errors, "brand", "Brand is required");
        }
        if self.model.trim().is_empty() {
            reject(errors, "model", "Model is required");
        }

        let max_year = Utc::now().year() + 1;
        match self.year {
            None => reject(errors, "year", "Year is required"),
            Some(year) if !(MIN_YEAR..=max_year).contains(&year) => reject(
                errors,
                "year",
                &format!("Year must be between {} and {}", MIN_YEAR, max_year),
            ),
            Some(_) => {}
        }

        match self.price {
            None => reject(errors, "price", "Price is required"),
            Some(price) if !price.is_finite() || price < 0.0 => {
                reject(errors, "price", "Price must be a positive amount")
            }
            Some(_) => {}
        }

        if self.condition.trim().is_empty() {
            reject(errors, "condition", "Condition is required");
        } else if Condition::parse(&self.condition).is_none() {
            reject(errors, "condition", "Unknown condition");
        }
    }

    fn check_specifications(&self, errors: &mut FieldErrors) {
        if matches!(self.engine_power, Some(hp) if hp <= 0) {
            reject(errors, "enginePower", "Engine power must be positive");
        }
        if matches!(self.cutting_width, Some(cm) if cm <= 0) {
            reject(errors, "cuttingWidth", "Cutting width must be positive");
        }
        if !self.fuel_type.trim().is_empty() && FuelType::parse(&self.fuel_type).is_none() {
            reject(errors, "fuelType", "Unknown fuel type");
        }
        if !self.transmission.trim().is_empty()
            && Transmission::parse(&self.transmission).is_none()
        {
            reject(errors, "transmission", "Unknown transmission");
        }
    }

    fn check_photos(&self, errors: &mut FieldErrors) {
        if self.images.iter().any(|url| url.trim().is_empty()) {
            reject(errors, "images", "Image URLs cannot be empty");
        }
    }

    fn check_contact(&self, errors: &mut FieldErrors) {
        if self.location.trim().is_empty() {
            reject(errors, "location", "Location is required");
        }
        if matches!(self.distance, Some(d) if !d.is_finite() || d < 0.0) {
            reject(errors, "distance", "Distance cannot be negative");
        }
        if self.seller_name.trim().is_empty() {
            reject(errors, "sellerName", "Name is required");
        }
        let email = self.seller_email.trim();
        if email.is_empty() {
            reject(errors, "sellerEmail", "Email is required");
        } else if !is_valid_email(email) {
            reject(errors, "sellerEmail", "Invalid email format");
        }
    }
}

/// Admin edits follow the wizard rules for every field they touch.
pub fn validate_listing_update(request: &UpdateListingRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let required = [
        ("title", &request.title),
        ("brand", &request.brand),
        ("model", &request.model),
        ("location", &request.location),
    ];
    for (field, value) in required {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            reject(&mut errors, field, "Field cannot be empty");
        }
    }

    let max_year = Utc::now().year() + 1;
    if matches!(request.year, Some(year) if !(MIN_YEAR..=max_year).contains(&year)) {
        reject(
            &mut errors,
            "year",
            &format!("Year must be between {} and {}", MIN_YEAR, max_year),
        );
    }
    if matches!(request.price, Some(p) if !p.is_finite() || p < 0.0) {
        reject(&mut errors, "price", "Price must be a positive amount");
    }
    if matches!(&request.condition, Some(c) if Condition::parse(c).is_none()) {
        reject(&mut errors, "condition", "Unknown condition");
    }
    if matches!(request.distance, Some(d) if !d.is_finite() || d < 0.0) {
        reject(&mut errors, "distance", "Distance cannot be negative");
    }
    if let Some(images) = &request.images {
        if images.iter().any(|url| url.trim().is_empty()) {
            reject(&mut errors, "images", "Image URLs cannot be empty");
        }
    }
    if let Some(specs) = &request.specifications {
        if matches!(specs.engine_power, Some(hp) if hp <= 0) {
            reject(&mut errors, "enginePower", "Engine power must be positive");
        }
        if matches!(specs.cutting_width, Some(cm) if cm <= 0) {
            reject(&mut errors, "cuttingWidth", "Cutting width must be positive");
        }
    }
    if let Some(contact) = &request.seller_contact {
        if contact.name.trim().is_empty() {
            reject(&mut errors, "sellerName", "Name is required");
        }
        if !is_valid_email(contact.email.trim()) {
            reject(&mut errors, "sellerEmail", "Invalid email format");
        }
    }

    errors
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> ListingDraft {
        ListingDraft {
            title: "Husqvarna TC 138 en très bon état".to_string(),
            brand: "husqvarna".to_string(),
            model: "TC 138".to_string(),
            year: Some(2019),
            price: Some(1450.0),
            condition: "très bon".to_string(),
            description: "Entretenu chaque saison".to_string(),
            engine_power: Some(18),
            cutting_width: Some(97),
            fuel_type: "essence".to_string(),
            transmission: "hydrostatique".to_string(),
            images: vec!["https://img.example/1.jpg".to_string()],
            location: "Lyon".to_string(),
            distance: Some(12.0),
            seller_name: "Paul".to_string(),
            seller_email: "paul@example.fr".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_draft_step_one() {
        let errors = ListingDraft::default().validate_step(1).unwrap();
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(
            fields,
            vec!["brand", "condition", "model", "price", "title", "year"]
        );
    }

    #[test]
    fn test_optional_steps_accept_empty_draft() {
        let draft = ListingDraft::default();
        assert!(draft.validate_step(2).unwrap().is_empty());
        assert!(draft.validate_step(3).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_step_is_bad_request() {
        let err = ListingDraft::default().validate_step(5).unwrap_err();
        assert_eq!(err.error_code(), "BAD_REQUEST");
        assert!(ListingDraft::default().validate_step(0).is_err());
    }

    #[test]
    fn test_contact_step_email_format() {
        let mut draft = complete_draft();
        draft.seller_email = "paul-at-example".to_string();
        let errors = draft.validate_step(4).unwrap();
        assert_eq!(errors["sellerEmail"], "Invalid email format");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_year_and_condition_bounds() {
        let mut draft = complete_draft();
        draft.year = Some(1850);
        draft.condition = "neuf".to_string();
        draft.price = Some(-5.0);
        let errors = draft.validate_step(1).unwrap();
        assert!(errors["year"].starts_with("Year must be between 1900"));
        assert_eq!(errors["condition"], "Unknown condition");
        assert_eq!(errors["price"], "Price must be a positive amount");
    }

    #[test]
    fn test_specification_checks() {
        let mut draft = complete_draft();
        draft.engine_power = Some(0);
        draft.fuel_type = "kerosene".to_string();
        let errors = draft.validate_step(2).unwrap();
        assert!(errors.contains_key("enginePower"));
        assert!(errors.contains_key("fuelType"));
        assert!(!errors.contains_key("transmission"));
    }

    #[test]
    fn test_into_new_listing() {
        let listing = complete_draft().into_new_listing().unwrap();
        assert_eq!(listing.condition, Condition::VeryGood);
        assert_eq!(listing.specifications.fuel_type, Some(FuelType::Essence));
        assert_eq!(
            listing.specifications.transmission,
            Some(Transmission::Hydrostatique)
        );
        assert_eq!(listing.specifications.deck_type, None);
        assert_eq!(listing.seller_contact.phone, None);
        assert_eq!(listing.distance, 12.0);
        assert!(!listing.featured);
    }

    #[test]
    fn test_into_new_listing_reports_every_step() {
        let mut draft = complete_draft();
        draft.title.clear();
        draft.seller_name.clear();
        match draft.into_new_listing() {
            Err(AppError::InvalidFields(fields)) => {
                assert!(fields.contains_key("title"));
                assert!(fields.contains_key("sellerName"));
            }
            other => panic!("expected field errors, got {:?}", other),
        }
    }

    #[test]
    fn test_listing_update_checks_only_given_fields() {
        assert!(validate_listing_update(&UpdateListingRequest::default()).is_empty());

        let request = UpdateListingRequest {
            title: Some("  ".to_string()),
            price: Some(-1.0),
            seller_contact: Some(SellerContact {
                name: "Paul".to_string(),
                phone: None,
                email: "nope".to_string(),
            }),
            ..Default::default()
        };
        let errors = validate_listing_update(&request);
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["price", "sellerEmail", "title"]);
    }

    #[test]
    fn test_listing_update_condition_text() {
        let request = UpdateListingRequest {
            condition: Some("Très Bon".to_string()),
            ..Default::default()
        };
        assert!(validate_listing_update(&request).is_empty());

        let request = UpdateListingRequest {
            condition: Some("neuf".to_string()),
            ..Default::default()
        };
        let errors = validate_listing_update(&request);
        assert!(errors.contains_key("condition"));
    }
}
