//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for listings, brands, messages and saved sets.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations. Every statement is idempotent.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS listings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            brand TEXT NOT NULL,
            model TEXT NOT NULL,
            year INTEGER NOT NULL,
            price REAL NOT NULL,
            condition TEXT NOT NULL,
            location TEXT NOT NULL,
            distance REAL NOT NULL DEFAULT 0,
            images TEXT NOT NULL DEFAULT '[]',
            description TEXT NOT NULL DEFAULT '',
            engine_power INTEGER,
            cutting_width INTEGER,
            fuel_type TEXT,
            transmission TEXT,
            deck_type TEXT,
            wheel_drive TEXT,
            seller_name TEXT NOT NULL,
            seller_phone TEXT,
            seller_email TEXT NOT NULL,
            posted_date TEXT NOT NULL,
            featured INTEGER NOT NULL DEFAULT 0,
            version INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS brands (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            country TEXT NOT NULL,
            founded_year INTEGER,
            description TEXT NOT NULL DEFAULT '',
            logo_url TEXT NOT NULL DEFAULT '',
            is_active INTEGER NOT NULL DEFAULT 1,
            website TEXT NOT NULL DEFAULT '',
            specialties TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            version INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            listing_id INTEGER NOT NULL,
            sender_name TEXT NOT NULL,
            sender_email TEXT NOT NULL,
            sender_phone TEXT,
            message TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_listings (
            owner TEXT NOT NULL,
            listing_id INTEGER NOT NULL,
            saved_at TEXT NOT NULL,
            PRIMARY KEY (owner, listing_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_listings_posted_date ON listings(posted_date);
        CREATE INDEX IF NOT EXISTS idx_listings_brand ON listings(brand);
        CREATE INDEX IF NOT EXISTS idx_listings_featured ON listings(featured);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_brands_name_nocase ON brands(name COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp);
        CREATE INDEX IF NOT EXISTS idx_messages_listing ON messages(listing_id);
        CREATE INDEX IF NOT EXISTS idx_saved_listing ON saved_listings(listing_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
