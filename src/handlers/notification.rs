// src/handlers/notification.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    services::notification,
    utils::{jwt::Claims, negotiate::Negotiated},
};

/// The caller's notifications, newest first, with the unread count.
pub async fn list_notifications(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let items = notification::list_for(&pool, user_id).await?;
    let unread_count = notification::unread_count(&pool, user_id).await?;

    Ok(Json(json!({
        "unread_count": unread_count,
        "items": items,
    })))
}

pub async fn mark_read(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    negotiated: Negotiated,
) -> Result<Response, AppError> {
    notification::mark_read(&pool, claims.user_id()?, id).await?;
    Ok(negotiated.respond(StatusCode::OK, json!({ "id": id, "is_read": true }), "/notifications/"))
}

pub async fn mark_all_read(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    negotiated: Negotiated,
) -> Result<Response, AppError> {
    let updated = notification::mark_all_read(&pool, claims.user_id()?).await?;
    Ok(negotiated.respond(StatusCode::OK, json!({ "updated": updated }), "/notifications/"))
}
