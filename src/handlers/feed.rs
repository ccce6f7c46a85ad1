// src/handlers/feed.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    error::AppError,
    models::post::FeedParams,
    services::{
        feed::{self, PostFilter},
        post,
    },
};

/// Home feed: newest first, optional `?q=` keyword over title and content.
pub async fn index(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Query(params): Query<FeedParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = PostFilter::keyword(params.keyword());
    let page = feed::list_posts(&pool, &filter, config.page_size, params.page.as_deref()).await?;
    Ok(Json(page))
}

/// Enhanced search: keyword also matches author and tag names, and
/// `?tag=` narrows to one tag.
pub async fn search(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Query(params): Query<FeedParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = PostFilter {
        keyword: params.keyword().map(str::to_string),
        extended: true,
        tag_slug: params.tag_slug().map(str::to_string),
        author_id: None,
    };
    let page = feed::list_posts(&pool, &filter, config.page_size, params.page.as_deref()).await?;
    Ok(Json(page))
}

/// Most liked recent posts.
pub async fn trending(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
) -> Result<impl IntoResponse, AppError> {
    let posts = feed::trending(&pool, config.trending_days, config.page_size).await?;
    Ok(Json(json!({
        "days": config.trending_days,
        "items": posts,
    })))
}

/// Posts carrying one tag.
pub async fn tag_posts(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Path(slug): Path<String>,
    Query(params): Query<FeedParams>,
) -> Result<impl IntoResponse, AppError> {
    let tag = post::find_tag(&pool, &slug).await?;
    let filter = PostFilter {
        tag_slug: Some(tag.slug.clone()),
        ..Default::default()
    };
    let page = feed::list_posts(&pool, &filter, config.page_size, params.page.as_deref()).await?;
    Ok(Json(json!({
        "tag": tag,
        "page": page,
    })))
}
