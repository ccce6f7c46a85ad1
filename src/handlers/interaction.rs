// src/handlers/interaction.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    services::{account, interaction, profile},
    utils::{jwt::Claims, negotiate::Negotiated},
};

/// Toggle Like on a post.
///
/// AJAX callers get `{liked, total_likes}`; form posts go back to the page.
pub async fn toggle_like(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    negotiated: Negotiated,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    let state = interaction::toggle_like(&pool, user_id, post_id).await?;

    Ok(negotiated.respond(
        StatusCode::OK,
        serde_json::to_value(state)?,
        &format!("/post/{}/", post_id),
    ))
}

/// Toggle Bookmark on a post.
pub async fn toggle_bookmark(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    negotiated: Negotiated,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    let state = interaction::toggle_bookmark(&pool, user_id, post_id).await?;

    Ok(negotiated.respond(
        StatusCode::OK,
        serde_json::to_value(state)?,
        &format!("/post/{}/", post_id),
    ))
}

/// Toggle Follow on a user. Following yourself is refused.
pub async fn toggle_follow(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
    negotiated: Negotiated,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;
    let target = account::find_by_username(&pool, &username).await?;
    let back = format!("/profile/{}/", target.username);

    match interaction::toggle_follow(&pool, user_id, target.id).await {
        Ok(state) => Ok(negotiated.respond(StatusCode::OK, serde_json::to_value(state)?, &back)),
        Err(err @ AppError::BadRequest(_)) => Ok(negotiated.refuse(err, &back)),
        Err(err) => Err(err),
    }
}

/// List posts bookmarked by the current user.
pub async fn list_bookmarks(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let list = profile::bookmarks(&pool, user_id).await?;
    Ok(Json(list))
}
