// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::{post::PostSummary, profile::UpdateProfileRequest},
    services::{
        account,
        feed::{self, PostFilter},
        profile,
    },
    utils::{
        jwt::{Claims, Viewer},
        negotiate::{JsonOrForm, Negotiated},
    },
};

/// Get the current user's profile and statistics.
pub async fn my_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = account::find_by_id(&pool, claims.user_id()?).await?;
    let view = profile::profile_view(&pool, &user, None).await?;
    Ok(Json(json!({
        "email": user.email,
        "profile": view,
    })))
}

/// Edit the current user's profile.
pub async fn update_my_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    negotiated: Negotiated,
    JsonOrForm(payload): JsonOrForm<UpdateProfileRequest>,
) -> Result<Response, AppError> {
    let changes = payload.into_changes()?;
    let updated = profile::update_profile(&pool, claims.user_id()?, changes).await?;

    Ok(negotiated.respond_to(StatusCode::OK, serde_json::to_value(updated)?, "/profile/"))
}

/// A user's public page: profile, counts and their latest posts.
pub async fn public_profile(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Extension(viewer): Extension<Viewer>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = account::find_by_username(&pool, &username).await?;
    let view = profile::profile_view(&pool, &user, viewer.user_id()).await?;

    let filter = PostFilter {
        author_id: Some(user.id),
        ..Default::default()
    };
    let posts: Vec<PostSummary> = feed::list_posts(&pool, &filter, config.page_size, None)
        .await?
        .items;

    Ok(Json(json!({
        "profile": view,
        "posts": posts,
    })))
}

pub async fn list_followers(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = account::find_by_username(&pool, &username).await?;
    Ok(Json(profile::followers(&pool, user.id).await?))
}

pub async fn list_following(
    State(pool): State<SqlitePool>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = account::find_by_username(&pool, &username).await?;
    Ok(Json(profile::following(&pool, user.id).await?))
}
