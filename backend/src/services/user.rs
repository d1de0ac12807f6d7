//! User accounts: registration, credential checks and profiles

use bcrypt::{hash, verify, DEFAULT_COST};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::User;
use shared::validation::{validate_email, validate_password};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, phone, location, created_at, updated_at";

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("name", "Name is required"));
        }
        let email = normalize_email(&input.email);
        validate_email(&email).map_err(|m| AppError::validation("email", m))?;
        validate_password(&input.password).map_err(|m| AppError::validation("password", m))?;

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, phone, location)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(name)
        .bind(&email)
        .bind(&password_hash)
        .bind(&input.phone)
        .bind(&input.location)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_unique(e, "email"))?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and return the profile
    pub async fn login(&self, input: LoginInput) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(normalize_email(&input.email))
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn get(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    pub async fn update_profile(&self, user_id: Uuid, input: UpdateProfileInput) -> AppResult<User> {
        if matches!(input.name.as_deref().map(str::trim), Some("")) {
            return Err(AppError::validation("name", "Name cannot be empty"));
        }

        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                location = COALESCE($4, location),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.phone)
        .bind(&input.location)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(normalize_email("  Owner@Shop.COM "), "owner@shop.com");
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hashed = hash("correct horse", 4).unwrap();
        assert!(verify("correct horse", &hashed).unwrap());
        assert!(!verify("wrong horse", &hashed).unwrap());
    }
}
