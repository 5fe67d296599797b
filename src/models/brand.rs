//! Brand model: a manufacturer whose machines are listed on the marketplace.

use serde::{Deserialize, Serialize};

/// A brand known to the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: i64,
    pub name: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    pub description: String,
    pub logo_url: String,
    pub is_active: bool,
    pub website: String,
    pub specialties: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Internal version for optimistic concurrency control
    #[serde(default)]
    pub version: i64,
}

/// Specialty tags as clients send them: either a list or a comma-separated line.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SpecialtiesInput {
    List(Vec<String>),
    Line(String),
}

impl SpecialtiesInput {
    /// Trimmed tags with empties removed, original order kept.
    pub fn normalize(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            SpecialtiesInput::List(items) => items.iter().map(String::as_str).collect(),
            SpecialtiesInput::Line(line) => line.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Request body for creating a brand.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub founded_year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub specialties: Option<SpecialtiesInput>,
}

fn default_active() -> bool {
    true
}

/// Request body for updating an existing brand.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrandRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// `Some(None)` clears the year; an absent field keeps it.
    #[serde(default, deserialize_with = "nullable")]
    pub founded_year: Option<Option<i32>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub specialties: Option<SpecialtiesInput>,
    /// Expected version for optimistic concurrency control
    #[serde(default)]
    pub expected_version: Option<i64>,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
