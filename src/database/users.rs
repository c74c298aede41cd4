use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::providers::Provider;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub governorate: Option<String>,
    pub image: Option<String>,
    /// Password hash; never serialized into responses.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub is_verified: bool,
    pub is_blocked: bool,
    pub google_linked: bool,
    pub apple_linked: bool,
    pub notification_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// First/last name, phone and governorate are all required before the
    /// profile counts as complete.
    pub fn has_complete_profile(&self) -> bool {
        fn present(v: &Option<String>) -> bool {
            v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
        }
        present(&self.first_name)
            && present(&self.last_name)
            && present(&self.phone)
            && present(&self.governorate)
    }

    /// Public wire shape for authentication responses. The password hash is
    /// structurally absent rather than nulled.
    pub fn public(&self) -> Value {
        json!({
            "id": self.id,
            "firstName": self.first_name,
            "lastName": self.last_name,
            "email": self.email,
            "image": self.image,
            "phone": self.phone,
            "googleLinked": self.google_linked,
            "appleLinked": self.apple_linked,
            "governorate": self.governorate,
        })
    }
}

/// Insert payload for a provider-originated signup.
#[derive(Debug, Clone)]
pub struct NewProviderUser {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image: Option<String>,
    pub provider: Provider,
    pub notification_token: String,
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn insert_provider_user(
    pool: &PgPool,
    new_user: &NewProviderUser,
) -> Result<User, sqlx::Error> {
    let (google_linked, apple_linked) = match new_user.provider {
        Provider::Google => (true, false),
        Provider::Apple => (false, true),
    };
    sqlx::query_as::<_, User>(
        "INSERT INTO users \
         (email, first_name, last_name, image, is_verified, google_linked, apple_linked, notification_token) \
         VALUES ($1, $2, $3, $4, TRUE, $5, $6, $7) \
         RETURNING *",
    )
    .bind(&new_user.email)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.image)
    .bind(google_linked)
    .bind(apple_linked)
    .bind(&new_user.notification_token)
    .fetch_one(pool)
    .await
}

pub async fn update_notification_token(
    pool: &PgPool,
    id: Uuid,
    token: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET notification_token = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}
