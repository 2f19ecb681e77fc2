//! Database repository for CRUD operations.
//!
//! Uses prepared statements, conditional updates and transactions for data integrity.

use chrono::{SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    Category, Claim, ClaimStatus, NewReview, PendingClaim, PendingReview, Restaurant,
    RestaurantFields, Review, ReviewStatus, Role, User,
};

const RESTAURANT_COLUMNS: &str = "id, name, address, cuisine, description, image_url, lat, lng, avg_rating, review_count, is_claimed, owner_id, created_at, updated_at";
const REVIEW_COLUMNS: &str = "id, restaurant_id, user_id, rating, comment, status, created_at";
const CLAIM_COLUMNS: &str = "id, restaurant_id, claimant_id, status, created_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ==================== USER OPERATIONS ====================

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Get a user by normalized email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Create a new user.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: now,
        })
    }

    /// Change the stored role of a user.
    pub async fn set_user_role(&self, id: &str, role: Role) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    // ==================== RESTAURANT OPERATIONS ====================

    /// List all restaurants.
    pub async fn list_restaurants(&self) -> Result<Vec<Restaurant>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM restaurants ORDER BY created_at, rowid",
            RESTAURANT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(restaurant_from_row).collect())
    }

    /// Get a restaurant by ID.
    pub async fn get_restaurant(&self, id: &str) -> Result<Option<Restaurant>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM restaurants WHERE id = ?",
            RESTAURANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(restaurant_from_row))
    }

    pub async fn count_restaurants(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM restaurants")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("total"))
    }

    /// Create a new restaurant.
    pub async fn create_restaurant(
        &self,
        fields: &RestaurantFields,
    ) -> Result<Restaurant, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();

        sqlx::query(
            "INSERT INTO restaurants (id, name, address, cuisine, description, image_url, lat, lng, avg_rating, review_count, is_claimed, owner_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0, 0, NULL, ?, ?)"
        )
        .bind(&id)
        .bind(&fields.name)
        .bind(&fields.address)
        .bind(&fields.cuisine)
        .bind(&fields.description)
        .bind(&fields.image_url)
        .bind(fields.position.map(|p| p.lat))
        .bind(fields.position.map(|p| p.lng))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Restaurant {
            id,
            name: fields.name.clone(),
            address: fields.address.clone(),
            cuisine: fields.cuisine.clone(),
            description: fields.description.clone(),
            image_url: fields.image_url.clone(),
            lat: fields.position.map(|p| p.lat),
            lng: fields.position.map(|p| p.lng),
            avg_rating: 0.0,
            review_count: 0,
            is_claimed: false,
            owner_id: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Overwrite the editable fields of a restaurant.
    ///
    /// Rating aggregates and ownership are left alone.
    pub async fn update_restaurant(
        &self,
        id: &str,
        fields: &RestaurantFields,
    ) -> Result<Restaurant, AppError> {
        let result = sqlx::query(
            "UPDATE restaurants SET name = ?, address = ?, cuisine = ?, description = ?, image_url = ?, lat = ?, lng = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&fields.name)
        .bind(&fields.address)
        .bind(&fields.cuisine)
        .bind(&fields.description)
        .bind(&fields.image_url)
        .bind(fields.position.map(|p| p.lat))
        .bind(fields.position.map(|p| p.lng))
        .bind(timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Restaurant {} not found", id)));
        }

        self.get_restaurant(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Restaurant {} not found", id)))
    }

    /// Delete a restaurant together with its reviews and claims.
    pub async fn delete_restaurant(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM restaurants WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Restaurant {} not found", id)));
        }
        Ok(())
    }

    /// Recompute average rating and review count from all non-removed reviews.
    ///
    /// Runs as one statement, so the read of the reviews and the write of the
    /// aggregate cannot interleave with another recompute.
    pub async fn refresh_restaurant_rating(&self, restaurant_id: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE restaurants SET
                avg_rating = COALESCE(
                    (SELECT AVG(rating) FROM reviews WHERE restaurant_id = ?1 AND status != 'removed'),
                    0
                ),
                review_count = (
                    SELECT COUNT(*) FROM reviews WHERE restaurant_id = ?1 AND status != 'removed'
                )
            WHERE id = ?1
            "#,
        )
        .bind(restaurant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ==================== REVIEW OPERATIONS ====================

    /// Approved reviews of a restaurant, newest first.
    pub async fn list_approved_reviews(
        &self,
        restaurant_id: &str,
    ) -> Result<Vec<Review>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE restaurant_id = ? AND status = 'approved' ORDER BY created_at DESC, rowid DESC",
            REVIEW_COLUMNS
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(review_from_row).collect())
    }

    /// All reviews written by a user, newest first.
    pub async fn list_reviews_by_user(&self, user_id: &str) -> Result<Vec<Review>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM reviews WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(review_from_row).collect())
    }

    /// Get a review by ID.
    pub async fn get_review(&self, id: &str) -> Result<Option<Review>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM reviews WHERE id = ?", REVIEW_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(review_from_row))
    }

    /// Create a new review.
    pub async fn create_review(&self, review: &NewReview) -> Result<Review, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();

        sqlx::query(
            "INSERT INTO reviews (id, restaurant_id, user_id, rating, comment, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&review.restaurant_id)
        .bind(&review.user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .bind(review.status.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Review {
            id,
            restaurant_id: review.restaurant_id.clone(),
            user_id: review.user_id.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            status: review.status,
            created_at: now,
        })
    }

    /// Move a review from `from` to `to`.
    ///
    /// The update only applies while the review still has status `from`; a
    /// concurrent moderation of the same review surfaces as a conflict.
    pub async fn transition_review(
        &self,
        id: &str,
        from: ReviewStatus,
        to: ReviewStatus,
    ) -> Result<Review, AppError> {
        let result = sqlx::query("UPDATE reviews SET status = ? WHERE id = ? AND status = ?")
            .bind(to.as_str())
            .bind(id)
            .bind(from.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.get_review(id).await? {
                Some(_) => Err(AppError::Conflict(format!(
                    "Review {} was moderated concurrently",
                    id
                ))),
                None => Err(AppError::NotFound(format!("Review {} not found", id))),
            };
        }

        self.get_review(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Review {} not found", id)))
    }

    /// Pending reviews with their restaurant names, oldest first.
    pub async fn list_pending_reviews(&self) -> Result<Vec<PendingReview>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.restaurant_id, r.user_id, r.rating, r.comment, r.status, r.created_at,
                   s.name AS restaurant_name
            FROM reviews r
            JOIN restaurants s ON s.id = r.restaurant_id
            WHERE r.status = 'pending'
            ORDER BY r.created_at, r.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PendingReview {
                review: review_from_row(row),
                restaurant_name: row.get("restaurant_name"),
            })
            .collect())
    }

    // ==================== CATEGORY OPERATIONS ====================

    /// List all categories.
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let rows =
            sqlx::query("SELECT id, name, description, created_at FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.iter().map(category_from_row).collect())
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: &str) -> Result<Option<Category>, AppError> {
        let row =
            sqlx::query("SELECT id, name, description, created_at FROM categories WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.as_ref().map(category_from_row))
    }

    /// Get a category by its exact name.
    pub async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        let row =
            sqlx::query("SELECT id, name, description, created_at FROM categories WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.as_ref().map(category_from_row))
    }

    /// Create a new category. The unique index rejects duplicate names.
    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();

        sqlx::query("INSERT INTO categories (id, name, description, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(description)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(Category {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
        })
    }

    /// Update a category.
    pub async fn update_category(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError> {
        let result = sqlx::query("UPDATE categories SET name = ?, description = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        self.get_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    /// Delete a category.
    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }

    // ==================== CLAIM OPERATIONS ====================

    /// Get a claim by ID.
    pub async fn get_claim(&self, id: &str) -> Result<Option<Claim>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM claims WHERE id = ?", CLAIM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(claim_from_row))
    }

    /// Pending claim of a user for a restaurant, if any.
    pub async fn find_pending_claim(
        &self,
        restaurant_id: &str,
        claimant_id: &str,
    ) -> Result<Option<Claim>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM claims WHERE restaurant_id = ? AND claimant_id = ? AND status = 'pending'",
            CLAIM_COLUMNS
        ))
        .bind(restaurant_id)
        .bind(claimant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(claim_from_row))
    }

    /// Create a pending claim.
    pub async fn create_claim(
        &self,
        restaurant_id: &str,
        claimant_id: &str,
    ) -> Result<Claim, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp();

        sqlx::query(
            "INSERT INTO claims (id, restaurant_id, claimant_id, status, created_at) VALUES (?, ?, ?, 'pending', ?)",
        )
        .bind(&id)
        .bind(restaurant_id)
        .bind(claimant_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Claim {
            id,
            restaurant_id: restaurant_id.to_string(),
            claimant_id: claimant_id.to_string(),
            status: ClaimStatus::Pending,
            created_at: now,
        })
    }

    /// Pending claims with restaurant name and claimant email, oldest first.
    pub async fn list_pending_claims(&self) -> Result<Vec<PendingClaim>, AppError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.restaurant_id, c.claimant_id, c.status, c.created_at,
                   s.name AS restaurant_name, u.email AS claimant_email
            FROM claims c
            JOIN restaurants s ON s.id = c.restaurant_id
            JOIN users u ON u.id = c.claimant_id
            WHERE c.status = 'pending' AND s.is_claimed = 0
            ORDER BY c.created_at, c.rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| PendingClaim {
                claim: claim_from_row(row),
                restaurant_name: row.get("restaurant_name"),
                claimant_email: row.get("claimant_email"),
            })
            .collect())
    }

    /// Approve a pending claim and hand the restaurant to the claimant.
    ///
    /// Both writes happen in one transaction.
    pub async fn approve_claim(&self, id: &str) -> Result<Claim, AppError> {
        let claim = self
            .get_claim(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Claim {} not found", id)))?;

        if claim.status != ClaimStatus::Pending {
            return Err(AppError::Conflict(format!("Claim {} is not pending", id)));
        }

        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("UPDATE claims SET status = 'approved' WHERE id = ? AND status = 'pending'")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!("Claim {} is not pending", id)));
        }

        let result = sqlx::query(
            "UPDATE restaurants SET owner_id = ?, is_claimed = 1, updated_at = ? WHERE id = ? AND is_claimed = 0",
        )
        .bind(&claim.claimant_id)
        .bind(timestamp())
        .bind(&claim.restaurant_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Restaurant {} is already claimed",
                claim.restaurant_id
            )));
        }

        tx.commit().await?;

        Ok(Claim {
            status: ClaimStatus::Approved,
            ..claim
        })
    }
}

// Helper functions for row conversion

/// Current time as a fixed-width RFC 3339 string, so text order is time order.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let role: String = row.get("role");
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: Role::parse(&role).unwrap_or(Role::User),
        created_at: row.get("created_at"),
    }
}

fn restaurant_from_row(row: &sqlx::sqlite::SqliteRow) -> Restaurant {
    let is_claimed: i64 = row.get("is_claimed");
    Restaurant {
        id: row.get("id"),
        name: row.get("name"),
        address: row.get("address"),
        cuisine: row.get("cuisine"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        lat: row.get("lat"),
        lng: row.get("lng"),
        avg_rating: row.get("avg_rating"),
        review_count: row.get("review_count"),
        is_claimed: is_claimed != 0,
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn review_from_row(row: &sqlx::sqlite::SqliteRow) -> Review {
    let status: String = row.get("status");
    Review {
        id: row.get("id"),
        restaurant_id: row.get("restaurant_id"),
        user_id: row.get("user_id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        status: ReviewStatus::parse(&status).unwrap_or(ReviewStatus::Pending),
        created_at: row.get("created_at"),
    }
}

fn category_from_row(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

fn claim_from_row(row: &sqlx::sqlite::SqliteRow) -> Claim {
    let status: String = row.get("status");
    Claim {
        id: row.get("id"),
        restaurant_id: row.get("restaurant_id"),
        claimant_id: row.get("claimant_id"),
        status: ClaimStatus::parse(&status).unwrap_or(ClaimStatus::Pending),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use crate::models::Position;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let url = format!("sqlite:{}", temp_dir.path().join("repo.sqlite").display());
        let pool = init_database(&url).await.expect("Failed to init DB");
        (Repository::new(pool), temp_dir)
    }

    fn fields(name: &str) -> RestaurantFields {
        RestaurantFields {
            name: name.to_string(),
            address: None,
            cuisine: None,
            description: None,
            image_url: None,
            position: None,
        }
    }

    fn review(restaurant_id: &str, user_id: &str, rating: i64) -> NewReview {
        NewReview {
            restaurant_id: restaurant_id.to_string(),
            user_id: user_id.to_string(),
            rating,
            comment: None,
            status: ReviewStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_rating_refresh_ignores_removed_reviews() {
        let (repo, _dir) = repo().await;
        let user = repo.create_user("a@example.com", "hash", Role::User).await.unwrap();
        let restaurant = repo.create_restaurant(&fields("Diner")).await.unwrap();

        let mut created = Vec::new();
        for rating in [2, 4, 5] {
            created.push(repo.create_review(&review(&restaurant.id, &user.id, rating)).await.unwrap());
        }
        repo.refresh_restaurant_rating(&restaurant.id).await.unwrap();
        let stored = repo.get_restaurant(&restaurant.id).await.unwrap().unwrap();
        assert!((stored.avg_rating - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(stored.review_count, 3);

        repo.transition_review(&created[0].id, ReviewStatus::Pending, ReviewStatus::Removed)
            .await
            .unwrap();
        repo.refresh_restaurant_rating(&restaurant.id).await.unwrap();
        let stored = repo.get_restaurant(&restaurant.id).await.unwrap().unwrap();
        assert!((stored.avg_rating - 4.5).abs() < 1e-9);
        assert_eq!(stored.review_count, 2);
    }

    #[tokio::test]
    async fn test_rating_refresh_without_reviews_is_zero() {
        let (repo, _dir) = repo().await;
        let restaurant = repo.create_restaurant(&fields("Empty")).await.unwrap();
        repo.refresh_restaurant_rating(&restaurant.id).await.unwrap();
        let stored = repo.get_restaurant(&restaurant.id).await.unwrap().unwrap();
        assert_eq!(stored.avg_rating, 0.0);
        assert_eq!(stored.review_count, 0);
    }

    #[tokio::test]
    async fn test_transition_requires_expected_status() {
        let (repo, _dir) = repo().await;
        let user = repo.create_user("a@example.com", "hash", Role::User).await.unwrap();
        let restaurant = repo.create_restaurant(&fields("Diner")).await.unwrap();
        let created = repo.create_review(&review(&restaurant.id, &user.id, 3)).await.unwrap();

        let approved = repo
            .transition_review(&created.id, ReviewStatus::Pending, ReviewStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, ReviewStatus::Approved);

        let again = repo
            .transition_review(&created.id, ReviewStatus::Pending, ReviewStatus::Removed)
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let missing = repo
            .transition_review("missing", ReviewStatus::Pending, ReviewStatus::Removed)
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_category_hits_unique_index() {
        let (repo, _dir) = repo().await;
        repo.create_category("Vegan", None).await.unwrap();
        let duplicate = repo.create_category("Vegan", Some("again")).await;
        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
        assert_eq!(repo.list_categories().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_restaurant_cascades() {
        let (repo, _dir) = repo().await;
        let user = repo.create_user("a@example.com", "hash", Role::User).await.unwrap();
        let mut with_position = fields("Mapped");
        with_position.position = Some(Position { lat: 1.0, lng: 2.0 });
        let restaurant = repo.create_restaurant(&with_position).await.unwrap();
        let created = repo.create_review(&review(&restaurant.id, &user.id, 3)).await.unwrap();
        repo.create_claim(&restaurant.id, &user.id).await.unwrap();

        repo.delete_restaurant(&restaurant.id).await.unwrap();
        assert!(repo.get_review(&created.id).await.unwrap().is_none());
        assert!(repo.list_pending_claims().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_restaurant(&restaurant.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_approve_claim_sets_owner_once() {
        let (repo, _dir) = repo().await;
        let first = repo.create_user("a@example.com", "hash", Role::User).await.unwrap();
        let second = repo.create_user("b@example.com", "hash", Role::User).await.unwrap();
        let restaurant = repo.create_restaurant(&fields("Diner")).await.unwrap();

        let claim_a = repo.create_claim(&restaurant.id, &first.id).await.unwrap();
        let claim_b = repo.create_claim(&restaurant.id, &second.id).await.unwrap();

        let approved = repo.approve_claim(&claim_a.id).await.unwrap();
        assert_eq!(approved.status, ClaimStatus::Approved);

        let stored = repo.get_restaurant(&restaurant.id).await.unwrap().unwrap();
        assert!(stored.is_claimed);
        assert_eq!(stored.owner_id.as_deref(), Some(first.id.as_str()));

        // The losing claim stays pending because the transaction rolled back.
        assert!(matches!(
            repo.approve_claim(&claim_b.id).await,
            Err(AppError::Conflict(_))
        ));
        let still_pending = repo.get_claim(&claim_b.id).await.unwrap().unwrap();
        assert_eq!(still_pending.status, ClaimStatus::Pending);

        // ...but no longer shows up for review once the restaurant has an owner.
        assert!(repo.list_pending_claims().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_user_email_conflicts() {
        let (repo, _dir) = repo().await;
        repo.create_user("a@example.com", "hash", Role::User).await.unwrap();
        assert!(matches!(
            repo.create_user("a@example.com", "hash", Role::User).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_category_names_ignore_case() {
        let (repo, _dir) = repo().await;
        let vegan = repo.create_category("Vegan", None).await.unwrap();

        let found = repo.get_category_by_name("VEGAN").await.unwrap().unwrap();
        assert_eq!(found.id, vegan.id);
        assert!(matches!(
            repo.create_category("vegan", None).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(repo.list_categories().await.unwrap().len(), 1);
    }
}
