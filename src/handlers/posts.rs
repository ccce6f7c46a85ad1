// src/handlers/posts.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{comment::CreateCommentRequest, post::CreatePostRequest},
    services::post,
    utils::{
        jwt::{Claims, Viewer},
        negotiate::{JsonOrForm, Negotiated},
    },
};

/// Create a new post.
/// Content is sanitized before it is stored.
pub async fn add_post(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    negotiated: Negotiated,
    JsonOrForm(payload): JsonOrForm<CreatePostRequest>,
) -> Result<Response, AppError> {
    let payload = payload.normalized();
    payload.validate()?;

    let user_id = claims.user_id()?;
    let post_id = post::create_post(&pool, user_id, &payload).await?;

    Ok(negotiated.respond_to(StatusCode::CREATED, json!({ "id": post_id }), "/"))
}

/// Get a single post with tags, gallery and comments.
pub async fn post_detail(
    State(pool): State<SqlitePool>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let detail = post::post_detail(&pool, id, viewer.user_id()).await?;
    Ok(Json(detail))
}

/// Add a comment to a post. Also mounted as `POST /post/{id}/`.
pub async fn add_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    negotiated: Negotiated,
    JsonOrForm(payload): JsonOrForm<CreateCommentRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let comment_id = post::add_comment(&pool, user_id, post_id, &payload.content).await?;

    Ok(negotiated.respond_to(
        StatusCode::CREATED,
        json!({ "id": comment_id, "post_id": post_id }),
        &format!("/post/{}/", post_id),
    ))
}

/// Delete a post. Requires: Login + Author.
///
/// Browsers that are refused are sent back with a flash message.
pub async fn delete_post(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    negotiated: Negotiated,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;

    match post::delete_post(&pool, user_id, id).await {
        Ok(()) => Ok(negotiated.respond_to(StatusCode::OK, json!({ "deleted": id }), "/")),
        Err(err @ AppError::Forbidden(_)) => {
            Ok(negotiated.refuse(err, &format!("/post/{}/", id)))
        }
        Err(err) => Err(err),
    }
}

/// Delete a comment. Requires: Login + (Comment author OR Post author).
pub async fn delete_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    negotiated: Negotiated,
) -> Result<Response, AppError> {
    let user_id = claims.user_id()?;

    match post::delete_comment(&pool, user_id, id).await {
        Ok(post_id) => Ok(negotiated.respond(
            StatusCode::OK,
            json!({ "deleted": id, "post_id": post_id }),
            &format!("/post/{}/", post_id),
        )),
        Err(err @ AppError::Forbidden(_)) => Ok(negotiated.refuse(err, "/")),
        Err(err) => Err(err),
    }
}
