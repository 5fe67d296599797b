//! Listing model: a classified ad for a tractor-mower.

use serde::{Deserialize, Serialize};

/// Condition of the machine as declared by the seller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Condition {
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "très bon")]
    VeryGood,
    #[serde(rename = "bon")]
    Good,
    #[serde(rename = "acceptable")]
    Acceptable,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Excellent,
        Condition::VeryGood,
        Condition::Good,
        Condition::Acceptable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Excellent => "excellent",
            Condition::VeryGood => "très bon",
            Condition::Good => "bon",
            Condition::Acceptable => "acceptable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == wanted)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Essence,
    Diesel,
    Electrique,
    Batterie,
}

impl FuelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Essence => "essence",
            FuelType::Diesel => "diesel",
            FuelType::Electrique => "electrique",
            FuelType::Batterie => "batterie",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "essence" => Some(FuelType::Essence),
            "diesel" => Some(FuelType::Diesel),
            "electrique" | "électrique" => Some(FuelType::Electrique),
            "batterie" => Some(FuelType::Batterie),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Manuelle,
    Hydrostatique,
    Automatique,
}

impl Transmission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manuelle => "manuelle",
            Transmission::Hydrostatique => "hydrostatique",
            Transmission::Automatique => "automatique",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "manuelle" => Some(Transmission::Manuelle),
            "hydrostatique" => Some(Transmission::Hydrostatique),
            "automatique" => Some(Transmission::Automatique),
            _ => None,
        }
    }
}

/// Technical sheet of a machine. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Specifications {
    /// Engine power in horsepower
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_power: Option<i32>,
    /// Cutting width in centimetres
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutting_width: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<FuelType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<Transmission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheel_drive: Option<String>,
}

impl Specifications {
    /// Flattened text used by the full-text index.
    pub fn search_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(fuel) = self.fuel_type {
            parts.push(fuel.as_str().to_string());
        }
        if let Some(transmission) = self.transmission {
            parts.push(transmission.as_str().to_string());
        }
        parts.extend(self.deck_type.clone());
        parts.extend(self.wheel_drive.clone());
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SellerContact {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub email: String,
}

/// A published listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub condition: Condition,
    pub location: String,
    pub distance: f64,
    pub images: Vec<String>,
    pub description: String,
    pub specifications: Specifications,
    pub seller_contact: SellerContact,
    pub posted_date: String,
    pub featured: bool,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// A fully validated listing ready to be stored. Produced by the posting wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub condition: Condition,
    pub location: String,
    pub distance: f64,
    pub images: Vec<String>,
    pub description: String,
    pub specifications: Specifications,
    pub seller_contact: SellerContact,
    pub featured: bool,
}

/// Request body for updating an existing listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Free text, matched like the wizard's condition field.
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specifications: Option<Specifications>,
    #[serde(default)]
    pub seller_contact: Option<SellerContact>,
    #[serde(default)]
    pub featured: Option<bool>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}
