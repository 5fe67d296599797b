//! In-memory catalog operations over listing and brand snapshots.
//!
//! Filtering and sorting are linear passes over a list already loaded from the
//! store; none of it touches the database.

mod brands;
mod gallery;
mod stats;

pub use brands::*;
pub use gallery::*;
pub use stats::*;

use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::models::{Condition, Listing};

/// Listing search criteria. Empty strings count as unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingFilters {
    /// Case-insensitive substring of the title.
    #[serde(alias = "keywords")]
    pub q: Option<String>,
    /// Exact brand, ignoring case.
    #[serde(alias = "brandFilter")]
    pub brand: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub price_min: Option<f64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub price_max: Option<f64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub year_min: Option<i32>,
    #[serde(deserialize_with = "blank_as_none")]
    pub year_max: Option<i32>,
    pub condition: Option<String>,
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    /// Maximum distance in kilometres.
    #[serde(deserialize_with = "blank_as_none")]
    pub radius: Option<f64>,
    #[serde(deserialize_with = "blank_as_none")]
    pub featured: Option<bool>,
}

impl ListingFilters {
    /// Number of criteria actually constraining the result.
    pub fn active_count(&self) -> usize {
        [
            set(&self.q),
            set(&self.brand),
            self.price_min.is_some(),
            self.price_max.is_some(),
            self.year_min.is_some(),
            self.year_max.is_some(),
            set(&self.condition),
            set(&self.location),
            self.radius.is_some(),
            self.featured == Some(true),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(q) = text(&self.q) {
            if !contains_ignore_case(&listing.title, q) {
                return false;
            }
        }
        if let Some(brand) = text(&self.brand) {
            if listing.brand.trim().to_lowercase() != brand.to_lowercase() {
                return false;
            }
        }
        if matches!(self.price_min, Some(min) if listing.price < min) {
            return false;
        }
        if matches!(self.price_max, Some(max) if listing.price > max) {
            return false;
        }
        if matches!(self.year_min, Some(min) if listing.year < min) {
            return false;
        }
        if matches!(self.year_max, Some(max) if listing.year > max) {
            return false;
        }
        if let Some(condition) = text(&self.condition) {
            // An unrecognised condition matches nothing.
            if Condition::parse(condition) != Some(listing.condition) {
                return false;
            }
        }
        if let Some(location) = text(&self.location) {
            if !contains_ignore_case(&listing.location, location) {
                return false;
            }
        }
        if matches!(self.radius, Some(radius) if listing.distance > radius) {
            return false;
        }
        if self.featured == Some(true) && !listing.featured {
            return false;
        }
        true
    }
}

/// Query strings carry numbers as text and forms send `field=` when cleared.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn set(value: &Option<String>) -> bool {
    text(value).is_some()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Result ordering for listing searches.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    Recent,
    PriceAsc,
    PriceDesc,
    YearDesc,
    YearAsc,
}

impl SortOption {
    /// Parse a sort key; anything unknown means `recent`.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "price-asc" => SortOption::PriceAsc,
            "price-desc" => SortOption::PriceDesc,
            "year-desc" => SortOption::YearDesc,
            "year-asc" => SortOption::YearAsc,
            _ => SortOption::Recent,
        }
    }

    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let primary = match self {
            SortOption::Recent => posted_at(b).cmp(&posted_at(a)),
            SortOption::PriceAsc => a.price.total_cmp(&b.price),
            SortOption::PriceDesc => b.price.total_cmp(&a.price),
            SortOption::YearDesc => b.year.cmp(&a.year),
            SortOption::YearAsc => a.year.cmp(&b.year),
        };
        primary.then_with(|| b.id.cmp(&a.id))
    }
}

/// Posting time; unparsable dates sort as oldest.
fn posted_at(listing: &Listing) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&listing.posted_date)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

pub fn sort_listings(listings: &mut [Listing], sort: SortOption) {
    listings.sort_by(|a, b| sort.compare(a, b));
}

/// Filter then sort a snapshot of listings.
pub fn apply(listings: Vec<Listing>, filters: &ListingFilters, sort: SortOption) -> Vec<Listing> {
    let mut matched: Vec<Listing> = listings.into_iter().filter(|l| filters.matches(l)).collect();
    sort_listings(&mut matched, sort);
    matched
}

/// The `limit` most recently posted listings, newest first.
pub fn recent(listings: Vec<Listing>, limit: usize) -> Vec<Listing> {
    let mut listings = listings;
    sort_listings(&mut listings, SortOption::Recent);
    listings.truncate(limit);
    listings
}


#[cfg(test)]
mod tests {
    use super::fixtures::listing;
    use super::*;

    fn sample() -> Vec<Listing> {
        let mut a = listing(1, "John Deere X350 tondeuse", "john-deere", 2500.0, 2018);
        a.location = "Villeurbanne".to_string();
        a.distance = 5.0;
        let mut b = listing(2, "Husqvarna TS 142", "husqvarna", 1800.0, 2020);
        b.condition = Condition::Excellent;
        b.distance = 40.0;
        let mut c = listing(3, "Autoportée Husqvarna TC 238", "Husqvarna", 3200.0, 2022);
        c.featured = true;
        c.location = "Grenoble".to_string();
        c.distance = 95.0;
        vec![a, b, c]
    }

    fn ids(listings: &[Listing]) -> Vec<i64> {
        listings.iter().map(|l| l.id).collect()
    }

    #[test]
    fn test_no_filters_sorts_recent_first() {
        let result = apply(sample(), &ListingFilters::default(), SortOption::Recent);
        assert_eq!(ids(&result), vec![3, 2, 1]);
    }

    #[test]
    fn test_keyword_and_brand_filters() {
        let filters = ListingFilters {
            q: Some("HUSQVARNA".to_string()),
            brand: Some("husqvarna".to_string()),
            ..Default::default()
        };
        let result = apply(sample(), &filters, SortOption::PriceAsc);
        assert_eq!(ids(&result), vec![2, 3]);
        assert_eq!(filters.active_count(), 2);
    }

    #[test]
    fn test_ranges_are_inclusive() {
        let filters = ListingFilters {
            price_min: Some(1800.0),
            price_max: Some(2500.0),
            year_min: Some(2018),
            year_max: Some(2020),
            ..Default::default()
        };
        let result = apply(sample(), &filters, SortOption::YearDesc);
        assert_eq!(ids(&result), vec![2, 1]);
    }

    #[test]
    fn test_condition_location_radius_featured() {
        let by_condition = ListingFilters {
            condition: Some("Excellent".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&apply(sample(), &by_condition, SortOption::Recent)), vec![2]);

        let unknown_condition = ListingFilters {
            condition: Some("neuf".to_string()),
            ..Default::default()
        };
        assert!(apply(sample(), &unknown_condition, SortOption::Recent).is_empty());

        let by_location = ListingFilters {
            location: Some("villeur".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&apply(sample(), &by_location, SortOption::Recent)), vec![1]);

        let within = ListingFilters {
            radius: Some(40.0),
            ..Default::default()
        };
        assert_eq!(ids(&apply(sample(), &within, SortOption::Recent)), vec![2, 1]);

        let featured = ListingFilters {
            featured: Some(true),
            ..Default::default()
        };
        assert_eq!(ids(&apply(sample(), &featured, SortOption::Recent)), vec![3]);
    }

    #[test]
    fn test_filters_from_query_string() {
        let filters: ListingFilters = serde_json::from_value(serde_json::json!({
            "q": "deere",
            "priceMin": "1000",
            "priceMax": "",
            "yearMin": " 2015 ",
            "radius": "25.5",
            "featured": "true"
        }))
        .unwrap();
        assert_eq!(filters.q.as_deref(), Some("deere"));
        assert_eq!(filters.price_min, Some(1000.0));
        assert_eq!(filters.price_max, None);
        assert_eq!(filters.year_min, Some(2015));
        assert_eq!(filters.radius, Some(25.5));
        assert_eq!(filters.featured, Some(true));
        assert_eq!(filters.active_count(), 5);

        let bad = serde_json::from_value::<ListingFilters>(serde_json::json!({ "yearMin": "old" }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_blank_strings_are_unset() {
        let filters = ListingFilters {
            q: Some("   ".to_string()),
            brand: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filters.active_count(), 0);
        assert_eq!(apply(sample(), &filters, SortOption::Recent).len(), 3);
    }

    #[test]
    fn test_sort_options() {
        assert_eq!(ids(&apply(sample(), &ListingFilters::default(), SortOption::PriceDesc)), vec![3, 1, 2]);
        assert_eq!(ids(&apply(sample(), &ListingFilters::default(), SortOption::YearAsc)), vec![1, 2, 3]);
        assert_eq!(SortOption::parse("price-asc"), SortOption::PriceAsc);
        assert_eq!(SortOption::parse("cheapest"), SortOption::Recent);
    }

    #[test]
    fn test_ties_break_by_newest_id() {
        let a = listing(4, "A", "toro", 1000.0, 2020);
        let b = listing(5, "B", "toro", 1000.0, 2020);
        let result = apply(vec![a, b], &ListingFilters::default(), SortOption::PriceAsc);
        assert_eq!(ids(&result), vec![5, 4]);
    }

    #[test]
    fn test_recent_truncates() {
        let result = recent(sample(), 2);
        assert_eq!(ids(&result), vec![3, 2]);
        assert!(recent(Vec::new(), 12).is_empty());
    }
}
