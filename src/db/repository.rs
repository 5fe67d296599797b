//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Brand, BrandForm, Condition, FuelType, Listing, Message, NewListing, SavedListing,
    SellerContact, SendMessageRequest, Specifications, Transmission, UpdateBrandRequest,
    UpdateListingRequest,
};

const LISTING_COLUMNS: &str = r#"l.id, l.title, l.brand, l.model, l.year, l.price, l.condition,
    l.location, l.distance, l.images, l.description, l.engine_power, l.cutting_width,
    l.fuel_type, l.transmission, l.deck_type, l.wheel_drive, l.seller_name, l.seller_phone,
    l.seller_email, l.posted_date, l.featured, l.version"#;

const BRAND_COLUMNS: &str = "id, name, country, founded_year, description, logo_url, is_active, website, specialties, created_at, updated_at, version";

const MESSAGE_COLUMNS: &str =
    "id, listing_id, sender_name, sender_email, sender_phone, message, timestamp";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== LISTING OPERATIONS ====================

    /// List all listings, most recently posted first.
    pub async fn list_listings(&self) -> Result<Vec<Listing>, AppError> {
        let sql = format!(
            "SELECT {} FROM listings l ORDER BY l.posted_date DESC, l.id DESC",
            LISTING_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(listing_from_row).collect()
    }

    /// Get a listing by ID.
    pub async fn get_listing(&self, id: i64) -> Result<Option<Listing>, AppError> {
        let sql = format!("SELECT {} FROM listings l WHERE l.id = ?", LISTING_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(listing_from_row).transpose()
    }

    pub async fn count_listings(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Store a validated listing. The posting date is assigned here.
    pub async fn create_listing(&self, listing: &NewListing) -> Result<Listing, AppError> {
        let now = timestamp();
        let images_json = serde_json::to_string(&listing.images)?;
        let specs = &listing.specifications;

        let result = sqlx::query(
            r#"INSERT INTO listings (
                title, brand, model, year, price, condition, location, distance, images,
                description, engine_power, cutting_width, fuel_type, transmission, deck_type,
                wheel_drive, seller_name, seller_phone, seller_email, posted_date, featured, version
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)"#,
        )
        .bind(&listing.title)
        .bind(&listing.brand)
        .bind(&listing.model)
        .bind(listing.year)
        .bind(listing.price)
        .bind(listing.condition.as_str())
        .bind(&listing.location)
        .bind(listing.distance)
        .bind(&images_json)
        .bind(&listing.description)
        .bind(specs.engine_power)
        .bind(specs.cutting_width)
        .bind(specs.fuel_type.map(|f| f.as_str()))
        .bind(specs.transmission.map(|t| t.as_str()))
        .bind(&specs.deck_type)
        .bind(&specs.wheel_drive)
        .bind(&listing.seller_contact.name)
        .bind(&listing.seller_contact.phone)
        .bind(&listing.seller_contact.email)
        .bind(&now)
        .bind(listing.featured as i32)
        .execute(&self.pool)
        .await?;

        Ok(Listing {
            id: result.last_insert_rowid(),
            title: listing.title.clone(),
            brand: listing.brand.clone(),
            model: listing.model.clone(),
            year: listing.year,
            price: listing.price,
            condition: listing.condition,
            location: listing.location.clone(),
            distance: listing.distance,
            images: listing.images.clone(),
            description: listing.description.clone(),
            specifications: listing.specifications.clone(),
            seller_contact: listing.seller_contact.clone(),
            posted_date: now,
            featured: listing.featured,
            version: 1,
        })
    }

    /// Update a listing with optimistic concurrency control.
    pub async fn update_listing(
        &self,
        id: i64,
        request: &UpdateListingRequest,
    ) -> Result<Listing, AppError> {
        let existing = self
            .get_listing(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", id)))?;

        check_version(request.expected_version, existing.version)?;

        let new_version = existing.version + 1;
        let updated = Listing {
            id,
            title: request.title.clone().unwrap_or(existing.title),
            brand: request.brand.clone().unwrap_or(existing.brand),
            model: request.model.clone().unwrap_or(existing.model),
            year: request.year.unwrap_or(existing.year),
            price: request.price.unwrap_or(existing.price),
            condition: request
                .condition
                .as_deref()
                .and_then(Condition::parse)
                .unwrap_or(existing.condition),
            location: request.location.clone().unwrap_or(existing.location),
            distance: request.distance.unwrap_or(existing.distance),
            images: request.images.clone().unwrap_or(existing.images),
            description: request.description.clone().unwrap_or(existing.description),
            specifications: request
                .specifications
                .clone()
                .unwrap_or(existing.specifications),
            seller_contact: request
                .seller_contact
                .clone()
                .unwrap_or(existing.seller_contact),
            posted_date: existing.posted_date,
            featured: request.featured.unwrap_or(existing.featured),
            version: new_version,
        };

        let images_json = serde_json::to_string(&updated.images)?;
        let specs = &updated.specifications;

        // Conditional UPDATE with version check to prevent lost updates
        let result = sqlx::query(
            r#"UPDATE listings SET
                title = ?, brand = ?, model = ?, year = ?, price = ?, condition = ?,
                location = ?, distance = ?, images = ?, description = ?,
                engine_power = ?, cutting_width = ?, fuel_type = ?, transmission = ?,
                deck_type = ?, wheel_drive = ?, seller_name = ?, seller_phone = ?,
                seller_email = ?, featured = ?, version = ?
            WHERE id = ? AND version = ?"#,
        )
        .bind(&updated.title)
        .bind(&updated.brand)
        .bind(&updated.model)
        .bind(updated.year)
        .bind(updated.price)
        .bind(updated.condition.as_str())
        .bind(&updated.location)
        .bind(updated.distance)
        .bind(&images_json)
        .bind(&updated.description)
        .bind(specs.engine_power)
        .bind(specs.cutting_width)
        .bind(specs.fuel_type.map(|f| f.as_str()))
        .bind(specs.transmission.map(|t| t.as_str()))
        .bind(&specs.deck_type)
        .bind(&specs.wheel_drive)
        .bind(&updated.seller_contact.name)
        .bind(&updated.seller_contact.phone)
        .bind(&updated.seller_contact.email)
        .bind(updated.featured as i32)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_listing(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|l| l.version).unwrap_or(0),
            });
        }

        Ok(updated)
    }

    /// Delete a listing and drop it from every saved set.
    pub async fn delete_listing(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM listings WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Listing {} not found", id)));
        }

        sqlx::query("DELETE FROM saved_listings WHERE listing_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // ==================== BRAND OPERATIONS ====================

    /// List all brands ordered by name.
    pub async fn list_brands(&self) -> Result<Vec<Brand>, AppError> {
        let sql = format!(
            "SELECT {} FROM brands ORDER BY name COLLATE NOCASE",
            BRAND_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(brand_from_row).collect()
    }

    /// Get a brand by ID.
    pub async fn get_brand(&self, id: i64) -> Result<Option<Brand>, AppError> {
        let sql = format!("SELECT {} FROM brands WHERE id = ?", BRAND_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(brand_from_row).transpose()
    }

    /// Find a brand by name, ignoring case and surrounding whitespace.
    pub async fn find_brand_by_name(&self, name: &str) -> Result<Option<Brand>, AppError> {
        let wanted = name.trim().to_lowercase();
        let brands = self.list_brands().await?;
        Ok(brands
            .into_iter()
            .find(|b| b.name.trim().to_lowercase() == wanted))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<i64>) -> Result<(), AppError> {
        match self.find_brand_by_name(name).await? {
            Some(other) if Some(other.id) != except => Err(AppError::Duplicate(format!(
                "A brand named {} already exists",
                other.name
            ))),
            _ => Ok(()),
        }
    }

    /// Create a brand. Names are unique regardless of case.
    pub async fn create_brand(&self, form: &BrandForm) -> Result<Brand, AppError> {
        let name = form.name.trim().to_string();
        self.ensure_name_free(&name, None).await?;

        let now = timestamp();
        let specialties = form
            .specialties
            .as_ref()
            .map(|s| s.normalize())
            .unwrap_or_default();
        let specialties_json = serde_json::to_string(&specialties)?;

        let brand = Brand {
            id: 0,
            name,
            country: form.country.trim().to_string(),
            founded_year: form.founded_year,
            description: form.description.clone().unwrap_or_default(),
            logo_url: form.logo_url.clone().unwrap_or_default(),
            is_active: form.is_active,
            website: form.website.clone().unwrap_or_default(),
            specialties,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
        };

        let result = sqlx::query(
            "INSERT INTO brands (name, country, founded_year, description, logo_url, is_active, website, specialties, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)"
        )
        .bind(&brand.name)
        .bind(&brand.country)
        .bind(brand.founded_year)
        .bind(&brand.description)
        .bind(&brand.logo_url)
        .bind(brand.is_active as i32)
        .bind(&brand.website)
        .bind(&specialties_json)
        .bind(&brand.created_at)
        .bind(&brand.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| brand_write_error(e, &brand.name))?;

        Ok(Brand {
            id: result.last_insert_rowid(),
            ..brand
        })
    }

    /// Update a brand with optimistic concurrency control.
    pub async fn update_brand(
        &self,
        id: i64,
        request: &UpdateBrandRequest,
    ) -> Result<Brand, AppError> {
        let existing = self
            .get_brand(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Brand {} not found", id)))?;

        check_version(request.expected_version, existing.version)?;

        let name = match &request.name {
            Some(name) => {
                let name = name.trim().to_string();
                self.ensure_name_free(&name, Some(id)).await?;
                name
            }
            None => existing.name.clone(),
        };

        let new_version = existing.version + 1;
        let updated = Brand {
            id,
            name,
            country: request
                .country
                .as_ref()
                .map(|c| c.trim().to_string())
                .unwrap_or(existing.country),
            founded_year: match request.founded_year {
                Some(year) => year,
                None => existing.founded_year,
            },
            description: request.description.clone().unwrap_or(existing.description),
            logo_url: request.logo_url.clone().unwrap_or(existing.logo_url),
            is_active: request.is_active.unwrap_or(existing.is_active),
            website: request.website.clone().unwrap_or(existing.website),
            specialties: request
                .specialties
                .as_ref()
                .map(|s| s.normalize())
                .unwrap_or(existing.specialties),
            created_at: existing.created_at,
            updated_at: timestamp(),
            version: new_version,
        };
        let specialties_json = serde_json::to_string(&updated.specialties)?;

        let result = sqlx::query(
            "UPDATE brands SET name = ?, country = ?, founded_year = ?, description = ?, logo_url = ?, is_active = ?, website = ?, specialties = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?"
        )
        .bind(&updated.name)
        .bind(&updated.country)
        .bind(updated.founded_year)
        .bind(&updated.description)
        .bind(&updated.logo_url)
        .bind(updated.is_active as i32)
        .bind(&updated.website)
        .bind(&specialties_json)
        .bind(&updated.updated_at)
        .bind(new_version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await
        .map_err(|e| brand_write_error(e, &updated.name))?;

        if result.rows_affected() == 0 {
            let current = self.get_brand(id).await?;
            return Err(AppError::Conflict {
                message: "Concurrent modification detected".to_string(),
                current_version: current.map(|b| b.version).unwrap_or(0),
            });
        }

        Ok(updated)
    }

    /// Delete a brand. Listings naming it are left untouched.
    pub async fn delete_brand(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM brands WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Brand {} not found", id)));
        }

        Ok(())
    }

    // ==================== MESSAGE OPERATIONS ====================

    /// Inbox, newest first.
    pub async fn list_messages(&self) -> Result<Vec<Message>, AppError> {
        let sql = format!(
            "SELECT {} FROM messages ORDER BY timestamp DESC, id DESC",
            MESSAGE_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(message_from_row).collect())
    }

    pub async fn get_message(&self, id: i64) -> Result<Option<Message>, AppError> {
        let sql = format!("SELECT {} FROM messages WHERE id = ?", MESSAGE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(message_from_row))
    }

    /// Append a contact message. The listing reference is stored as given.
    pub async fn create_message(&self, request: &SendMessageRequest) -> Result<Message, AppError> {
        let now = timestamp();
        let phone = request
            .sender_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        let result = sqlx::query(
            "INSERT INTO messages (listing_id, sender_name, sender_email, sender_phone, message, timestamp) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(request.listing_id)
        .bind(request.sender_name.trim())
        .bind(request.sender_email.trim())
        .bind(&phone)
        .bind(request.message.trim())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            listing_id: request.listing_id,
            sender_name: request.sender_name.trim().to_string(),
            sender_email: request.sender_email.trim().to_string(),
            sender_phone: phone,
            message: request.message.trim().to_string(),
            timestamp: now,
        })
    }

    pub async fn delete_message(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Message {} not found", id)));
        }

        Ok(())
    }

    // ==================== SAVED LISTING OPERATIONS ====================

    /// Add a listing to an owner's saved set. Returns false if it was already there.
    pub async fn save_listing(&self, owner: &str, listing_id: i64) -> Result<bool, AppError> {
        if self.get_listing(listing_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Listing {} not found",
                listing_id
            )));
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO saved_listings (owner, listing_id, saved_at) VALUES (?, ?, ?)",
        )
        .bind(owner)
        .bind(listing_id)
        .bind(timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn unsave_listing(&self, owner: &str, listing_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM saved_listings WHERE owner = ? AND listing_id = ?")
            .bind(owner)
            .bind(listing_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Listing {} is not saved",
                listing_id
            )));
        }

        Ok(())
    }

    /// Saved listings that still exist, most recently saved first.
    pub async fn list_saved_listings(&self, owner: &str) -> Result<Vec<SavedListing>, AppError> {
        let sql = format!(
            r#"SELECT {}, s.saved_at
               FROM saved_listings s
               JOIN listings l ON l.id = s.listing_id
               WHERE s.owner = ?
               ORDER BY s.saved_at DESC, s.rowid DESC"#,
            LISTING_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(owner).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| -> Result<SavedListing, AppError> {
                Ok(SavedListing {
                    saved_at: row.get("saved_at"),
                    listing: listing_from_row(row)?,
                })
            })
            .collect()
    }

    /// Empty an owner's saved set, returning how many entries were removed.
    pub async fn clear_saved(&self, owner: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM saved_listings WHERE owner = ?")
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Current time in the fixed-width form every stored timestamp uses.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The unique name index backs up `ensure_name_free` when two writers race.
fn brand_write_error(err: sqlx::Error, name: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Duplicate(format!("A brand named {} already exists", name))
        }
        _ => err.into(),
    }
}

fn check_version(expected: Option<i64>, current: i64) -> Result<(), AppError> {
    match expected {
        Some(expected) if expected != current => Err(AppError::Conflict {
            message: format!(
                "Version mismatch: expected {}, current {}",
                expected, current
            ),
            current_version: current,
        }),
        _ => Ok(()),
    }
}

// Helper functions for row conversion

fn listing_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Listing, AppError> {
    let condition: String = row.get("condition");
    let condition = Condition::parse(&condition).ok_or_else(|| {
        AppError::Database(format!("Stored listing has unknown condition {:?}", condition))
    })?;
    let images: String = row.get("images");
    let featured: i32 = row.get("featured");
    let fuel_type: Option<String> = row.get("fuel_type");
    let transmission: Option<String> = row.get("transmission");

    Ok(Listing {
        id: row.get("id"),
        title: row.get("title"),
        brand: row.get("brand"),
        model: row.get("model"),
        year: row.get("year"),
        price: row.get("price"),
        condition,
        location: row.get("location"),
        distance: row.get("distance"),
        images: parse_json_array(&images, "images")?,
        description: row.get("description"),
        specifications: Specifications {
            engine_power: row.get("engine_power"),
            cutting_width: row.get("cutting_width"),
            fuel_type: fuel_type.as_deref().and_then(FuelType::parse),
            transmission: transmission.as_deref().and_then(Transmission::parse),
            deck_type: row.get("deck_type"),
            wheel_drive: row.get("wheel_drive"),
        },
        seller_contact: SellerContact {
            name: row.get("seller_name"),
            phone: row.get("seller_phone"),
            email: row.get("seller_email"),
        },
        posted_date: row.get("posted_date"),
        featured: featured != 0,
        version: row.get("version"),
    })
}

fn brand_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Brand, AppError> {
    let is_active: i32 = row.get("is_active");
    let specialties: String = row.get("specialties");
    Ok(Brand {
        id: row.get("id"),
        name: row.get("name"),
        country: row.get("country"),
        founded_year: row.get("founded_year"),
        description: row.get("description"),
        logo_url: row.get("logo_url"),
        is_active: is_active != 0,
        website: row.get("website"),
        specialties: parse_json_array(&specialties, "specialties")?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    })
}

fn message_from_row(row: &sqlx::sqlite::SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        listing_id: row.get("listing_id"),
        sender_name: row.get("sender_name"),
        sender_email: row.get("sender_email"),
        sender_phone: row.get("sender_phone"),
        message: row.get("message"),
        timestamp: row.get("timestamp"),
    }
}

fn parse_json_array(s: &str, column: &str) -> Result<Vec<String>, AppError> {
    serde_json::from_str(s)
        .map_err(|e| AppError::Database(format!("Stored {} is not a JSON array: {}", column, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::SpecialtiesInput;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("repo.sqlite")).await.unwrap();
        (Repository::new(pool), dir)
    }

    fn new_listing(title: &str) -> NewListing {
        NewListing {
            title: title.to_string(),
            brand: "toro".to_string(),
            model: "TimeCutter".to_string(),
            year: 2021,
            price: 4200.0,
            condition: Condition::Excellent,
            location: "Nantes".to_string(),
            distance: 3.5,
            images: vec!["https://img.example/a.jpg".to_string()],
            description: String::new(),
            specifications: Specifications {
                fuel_type: Some(FuelType::Essence),
                ..Default::default()
            },
            seller_contact: SellerContact {
                name: "Luc".to_string(),
                phone: None,
                email: "luc@example.fr".to_string(),
            },
            featured: false,
        }
    }

    #[tokio::test]
    async fn test_listing_round_trip_through_store() {
        let (repo, _dir) = repo().await;
        let created = repo.create_listing(&new_listing("Toro TimeCutter")).await.unwrap();
        assert!(created.id > 0);

        let loaded = repo.get_listing(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.condition, Condition::Excellent);
        assert_eq!(loaded.images, created.images);
        assert_eq!(loaded.specifications.fuel_type, Some(FuelType::Essence));
        assert_eq!(loaded.posted_date, created.posted_date);
        assert_eq!(repo.count_listings().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_listing_update_version_conflict() {
        let (repo, _dir) = repo().await;
        let created = repo.create_listing(&new_listing("A")).await.unwrap();

        let ok = repo
            .update_listing(
                created.id,
                &UpdateListingRequest {
                    price: Some(3900.0),
                    expected_version: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(ok.version, 2);
        assert_eq!(ok.price, 3900.0);
        assert_eq!(ok.title, "A");

        let stale = repo
            .update_listing(
                created.id,
                &UpdateListingRequest {
                    expected_version: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(stale.error_code(), "VERSION_MISMATCH");
    }

    #[tokio::test]
    async fn test_delete_listing_drops_saved_entries() {
        let (repo, _dir) = repo().await;
        let listing = repo.create_listing(&new_listing("A")).await.unwrap();

        assert!(repo.save_listing("owner-1", listing.id).await.unwrap());
        assert!(!repo.save_listing("owner-1", listing.id).await.unwrap());
        assert_eq!(repo.list_saved_listings("owner-1").await.unwrap().len(), 1);

        repo.delete_listing(listing.id).await.unwrap();
        assert!(repo.list_saved_listings("owner-1").await.unwrap().is_empty());
        assert_eq!(repo.clear_saved("owner-1").await.unwrap(), 0);

        let err = repo.delete_listing(listing.id).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_brand_names_unique_ignoring_case() {
        let (repo, _dir) = repo().await;
        let form = BrandForm {
            name: "Cub Cadet".to_string(),
            country: "USA".to_string(),
            is_active: true,
            specialties: Some(SpecialtiesInput::Line("autoportées, tracteurs".to_string())),
            ..Default::default()
        };
        let cub = repo.create_brand(&form).await.unwrap();
        assert_eq!(cub.specialties, vec!["autoportées", "tracteurs"]);

        let dup = BrandForm {
            name: "  cub cadet ".to_string(),
            ..form.clone()
        };
        assert_eq!(
            repo.create_brand(&dup).await.unwrap_err().error_code(),
            "DUPLICATE"
        );

        let toro = repo
            .create_brand(&BrandForm {
                name: "Toro".to_string(),
                ..form.clone()
            })
            .await
            .unwrap();

        // Renaming onto another brand's name is refused, keeping its own is not.
        let clash = repo
            .update_brand(
                toro.id,
                &UpdateBrandRequest {
                    name: Some("CUB CADET".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(clash.error_code(), "DUPLICATE");

        let same = repo
            .update_brand(
                toro.id,
                &UpdateBrandRequest {
                    name: Some("toro".to_string()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.name, "toro");
        assert!(!same.is_active);
        assert_eq!(same.version, 2);

        let names: Vec<String> = repo
            .list_brands()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Cub Cadet", "toro"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_brand_creates_keep_one() {
        let (repo, _dir) = repo().await;
        let form = BrandForm {
            name: "Toro".to_string(),
            country: "USA".to_string(),
            is_active: true,
            ..Default::default()
        };

        let mut handles = Vec::new();
        for i in 0..8 {
            let repo = repo.clone();
            let form = BrandForm {
                name: if i % 2 == 0 { "Toro" } else { "TORO" }.to_string(),
                ..form.clone()
            };
            handles.push(tokio::spawn(async move { repo.create_brand(&form).await }));
        }

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert_eq!(e.error_code(), "DUPLICATE"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(repo.list_brands().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_brand_founded_year_cleared() {
        let (repo, _dir) = repo().await;
        let brand = repo
            .create_brand(&BrandForm {
                name: "Husqvarna".to_string(),
                country: "Suède".to_string(),
                founded_year: Some(1689),
                is_active: true,
                ..Default::default()
            })
            .await
            .unwrap();

        let kept = repo
            .update_brand(
                brand.id,
                &UpdateBrandRequest {
                    country: Some("Sweden".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.founded_year, Some(1689));

        let cleared = repo
            .update_brand(
                brand.id,
                &UpdateBrandRequest {
                    founded_year: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.founded_year, None);
        let stored = repo.get_brand(brand.id).await.unwrap().unwrap();
        assert_eq!(stored.founded_year, None);
    }

    #[tokio::test]
    async fn test_corrupt_json_column_is_an_error() {
        let (repo, _dir) = repo().await;
        let created = repo.create_listing(&new_listing("Toro TimeCutter")).await.unwrap();

        sqlx::query("UPDATE listings SET images = 'not json' WHERE id = ?")
            .bind(created.id)
            .execute(&repo.pool)
            .await
            .unwrap();
        let err = repo.get_listing(created.id).await.unwrap_err();
        assert_eq!(err.error_code(), "DATABASE_ERROR");

        let brand = repo
            .create_brand(&BrandForm {
                name: "Stiga".to_string(),
                country: "Suède".to_string(),
                is_active: true,
                ..Default::default()
            })
            .await
            .unwrap();
        sqlx::query("UPDATE brands SET specialties = '{' WHERE id = ?")
            .bind(brand.id)
            .execute(&repo.pool)
            .await
            .unwrap();
        assert!(repo.get_brand(brand.id).await.is_err());
        assert!(repo.list_brands().await.is_err());
    }

    #[tokio::test]
    async fn test_messages_newest_first() {
        let (repo, _dir) = repo().await;
        for body in ["first", "second"] {
            repo.create_message(&SendMessageRequest {
                listing_id: 9,
                sender_name: "Anne".to_string(),
                sender_email: "anne@example.fr".to_string(),
                sender_phone: Some("   ".to_string()),
                message: body.to_string(),
            })
            .await
            .unwrap();
        }

        let inbox = repo.list_messages().await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].message, "second");
        assert_eq!(inbox[0].sender_phone, None);

        repo.delete_message(inbox[0].id).await.unwrap();
        assert!(repo.get_message(inbox[0].id).await.unwrap().is_none());
    }
}
