// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

static USERNAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.+-]+$").unwrap());

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Unique, compared case-insensitively.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_signup))]
pub struct CreateUserRequest {
    #[validate(
        length(
            min = 3,
            max = 150,
            message = "Username length must be between 3 and 150 characters."
        ),
        custom(function = validate_username)
    )]
    pub username: String,

    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254)
    )]
    pub email: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,

    pub password_confirm: String,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !USERNAME.is_match(username) {
        return Err(ValidationError::new("invalid_username")
            .with_message("Username may contain only letters, digits and _ . + -".into()));
    }
    Ok(())
}

/// Cross-field password rules: confirmation, not all digits, not the username.
fn validate_signup(req: &CreateUserRequest) -> Result<(), ValidationError> {
    if req.password != req.password_confirm {
        return Err(ValidationError::new("password_mismatch")
            .with_message("The two password fields didn't match.".into()));
    }
    if req.password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("password_numeric")
            .with_message("This password is entirely numeric.".into()));
    }
    if req.password.eq_ignore_ascii_case(&req.username) {
        return Err(ValidationError::new("password_similar")
            .with_message("The password is too similar to the username.".into()));
    }
    Ok(())
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// A user as shown in lists (followers, following).
#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    /// When the listed relationship started.
    pub since: chrono::DateTime<chrono::Utc>,
}
