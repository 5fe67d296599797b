//! Brand list filtering and ordering for the brand management screen.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::models::Brand;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BrandStatus {
    #[default]
    All,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BrandSortField {
    #[default]
    Name,
    Country,
    FoundedYear,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Query parameters of `GET /api/brands`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandQuery {
    /// Case-insensitive substring of name, country or description.
    pub search: Option<String>,
    pub status: BrandStatus,
    pub sort_by: BrandSortField,
    pub order: SortOrder,
}

impl BrandQuery {
    pub fn matches(&self, brand: &Brand) -> bool {
        let status_ok = match self.status {
            BrandStatus::All => true,
            BrandStatus::Active => brand.is_active,
            BrandStatus::Inactive => !brand.is_active,
        };
        if !status_ok {
            return false;
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                [&brand.name, &brand.country, &brand.description]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
        }
    }

    fn compare(&self, a: &Brand, b: &Brand) -> Ordering {
        let ordering = match self.sort_by {
            BrandSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            BrandSortField::Country => a.country.to_lowercase().cmp(&b.country.to_lowercase()),
            // Unknown founding year sorts as 0.
            BrandSortField::FoundedYear => a
                .founded_year
                .unwrap_or(0)
                .cmp(&b.founded_year.unwrap_or(0)),
        };
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    /// Filter then order a snapshot of brands.
    pub fn apply(&self, brands: Vec<Brand>) -> Vec<Brand> {
        let mut matched: Vec<Brand> = brands.into_iter().filter(|b| self.matches(b)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        matched
    }
}
