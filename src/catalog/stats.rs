//! Marketplace figures for the home page.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Brand, Listing};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrandCount {
    pub brand: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    pub total_listings: usize,
    pub featured_listings: usize,
    pub active_brands: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_price: Option<f64>,
    /// Listings per brand, largest first
    pub listings_by_brand: Vec<BrandCount>,
}

impl MarketStats {
    pub fn compute(listings: &[Listing], brands: &[Brand]) -> Self {
        // Group case-insensitively, report the first spelling seen.
        let mut by_brand: HashMap<String, BrandCount> = HashMap::new();
        for listing in listings {
            by_brand
                .entry(listing.brand.trim().to_lowercase())
                .or_insert_with(|| BrandCount {
                    brand: listing.brand.trim().to_string(),
                    count: 0,
                })
                .count += 1;
        }

        let mut listings_by_brand: Vec<BrandCount> = by_brand.into_values().collect();
        listings_by_brand.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.brand.to_lowercase().cmp(&b.brand.to_lowercase()))
        });

        let average_price = (!listings.is_empty())
            .then(|| listings.iter().map(|l| l.price).sum::<f64>() / listings.len() as f64);

        Self {
            total_listings: listings.len(),
            featured_listings: listings.iter().filter(|l| l.featured).count(),
            active_brands: brands.iter().filter(|b| b.is_active).count(),
            average_price,
            listings_by_brand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::listing;

    #[test]
    fn test_compute() {
        let mut featured = listing(3, "C", "Toro", 3000.0, 2021);
        featured.featured = true;
        let listings = vec![
            listing(1, "A", "husqvarna", 1000.0, 2019),
            listing(2, "B", "Husqvarna", 2000.0, 2020),
            featured,
            listing(4, "D", "craftsman", 2000.0, 2015),
        ];

        let stats = MarketStats::compute(&listings, &[]);
        assert_eq!(stats.total_listings, 4);
        assert_eq!(stats.featured_listings, 1);
        assert_eq!(stats.active_brands, 0);
        assert_eq!(stats.average_price, Some(2000.0));
        assert_eq!(
            stats.listings_by_brand,
            vec![
                BrandCount { brand: "husqvarna".to_string(), count: 2 },
                BrandCount { brand: "craftsman".to_string(), count: 1 },
                BrandCount { brand: "Toro".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_market() {
        let stats = MarketStats::compute(&[], &[]);
        assert_eq!(stats.total_listings, 0);
        assert_eq!(stats.average_price, None);
        assert!(stats.listings_by_brand.is_empty());
    }
}
