//! Database module for SQLite persistence.
//!
//! SQLite is the single source of truth for all application data.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::auth::hash_password_blocking;
use crate::config::AdminBootstrap;
use crate::errors::AppError;
use crate::models::{normalize_email, Position, RestaurantFields, Role};

/// Open the connection pool and run migrations.
pub async fn init_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                tracing::error!("Failed to create database directory {}: {}", parent.display(), e);
                sqlx::Error::Io(e)
            })?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS restaurants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            address TEXT,
            cuisine TEXT,
            description TEXT,
            image_url TEXT,
            lat REAL,
            lng REAL,
            avg_rating REAL NOT NULL DEFAULT 0,
            review_count INTEGER NOT NULL DEFAULT 0,
            is_claimed INTEGER NOT NULL DEFAULT 0,
            owner_id TEXT REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            restaurant_id TEXT NOT NULL REFERENCES restaurants(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
            comment TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            description TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS claims (
            id TEXT PRIMARY KEY,
            restaurant_id TEXT NOT NULL REFERENCES restaurants(id) ON DELETE CASCADE,
            claimant_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_restaurants_position ON restaurants(lat, lng);
        CREATE INDEX IF NOT EXISTS idx_reviews_restaurant ON reviews(restaurant_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_reviews_status ON reviews(status);
        CREATE INDEX IF NOT EXISTS idx_claims_status ON claims(status);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the configured administrator, or promote the account if it already exists.
pub async fn bootstrap_admin(repo: &Repository, admin: &AdminBootstrap) -> Result<(), AppError> {
    let email = normalize_email(&admin.email);

    if let Some(user) = repo.get_user_by_email(&email).await? {
        if user.role != Role::Admin {
            repo.set_user_role(&user.id, Role::Admin).await?;
            tracing::info!("Promoted {} to admin", email);
        }
        return Ok(());
    }

    let password_hash = hash_password_blocking(admin.password.clone()).await?;
    repo.create_user(&email, &password_hash, Role::Admin).await?;
    tracing::info!("Created admin account {}", email);
    Ok(())
}

/// Insert the demo restaurants into an empty database.
pub async fn seed_demo_restaurants(repo: &Repository) -> Result<usize, AppError> {
    if repo.count_restaurants().await? > 0 {
        tracing::info!("Restaurants present, skipping demo seed");
        return Ok(0);
    }

    let samples = [
        RestaurantFields {
            name: "Sushi House".to_string(),
            address: Some("1 Ocean Ave, Manchester, NH".to_string()),
            cuisine: Some("Japanese".to_string()),
            description: Some("Fresh sushi and sashimi.".to_string()),
            image_url: None,
            position: Some(Position {
                lat: 42.995,
                lng: -71.454,
            }),
        },
        RestaurantFields {
            name: "Burger Barn".to_string(),
            address: Some("50 Elm St, Manchester, NH".to_string()),
            cuisine: Some("American".to_string()),
            description: Some("Classic burgers with local ingredients.".to_string()),
            image_url: None,
            position: Some(Position {
                lat: 42.996,
                lng: -71.455,
            }),
        },
    ];

    for fields in &samples {
        repo.create_restaurant(fields).await?;
    }

    tracing::info!("Seeded {} demo restaurants", samples.len());
    Ok(samples.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_database_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("data").join("app.sqlite");
        let pool = init_database(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        pool.close().await;
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_init_database_reports_unusable_directory() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the database directory should be.
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let url = format!("sqlite:{}", blocker.join("data").join("app.sqlite").display());
        assert!(matches!(
            init_database(&url).await,
            Err(sqlx::Error::Io(_))
        ));
    }
}
