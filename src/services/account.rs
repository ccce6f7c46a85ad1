// src/services/account.rs

use sqlx::SqlitePool;

use crate::{
    db,
    error::{AppError, is_unique_violation},
    models::user::{CreateUserRequest, User},
    utils::hash::{hash_password, verify_password},
};

/// Creates a user together with its profile.
///
/// This is the only place users are created, so every user has exactly one
/// profile. Both rows are written in one transaction.
pub async fn create_user(pool: &SqlitePool, req: &CreateUserRequest) -> Result<User, AppError> {
    // Hash before taking the write lock.
    let hashed_password = hash_password(&req.password)?;

    let mut tx = db::begin_write(pool).await?;

    let taken_name = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
        .bind(&req.username)
        .fetch_optional(&mut *tx)
        .await?;
    if taken_name.is_some() {
        return Err(AppError::Conflict(format!(
            "Username '{}' already exists",
            req.username
        )));
    }

    let taken_email = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&mut *tx)
        .await?;
    if taken_email.is_some() {
        return Err(AppError::Conflict(
            "A user with that email already exists".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password)
        VALUES (?, ?, ?)
        RETURNING id, username, email, password, created_at
        "#,
    )
    .bind(&req.username)
    .bind(&req.email)
    .bind(&hashed_password)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Username or email already exists".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    sqlx::query("INSERT INTO profiles (user_id) VALUES (?)")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = user.id, username = %user.username, "User created");
    Ok(user)
}

/// Checks credentials. Unknown users and wrong passwords get the same error.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, created_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match user {
        Some(user) if verify_password(password, &user.password)? => Ok(user),
        _ => Err(AppError::AuthError(
            "Invalid username or password".to_string(),
        )),
    }
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, created_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
