// src/services/interaction.rs

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    db,
    error::AppError,
    models::notification::NotificationKind,
    services::notification::notify,
};

/// Result of flipping a witness row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// State after the toggle: true when the witness row exists.
    pub active: bool,
    /// True only when this call wrote a new witness row.
    pub created: bool,
}

/// Flips the witness row identified by the two keys.
///
/// Delete first; if nothing was there, insert. The insert is
/// `ON CONFLICT DO NOTHING`, so a concurrent toggle that inserted the same
/// row in between leaves one row and reports `created = false`.
async fn flip(
    conn: &mut SqliteConnection,
    delete_sql: &str,
    insert_sql: &str,
    first: i64,
    second: i64,
) -> Result<ToggleOutcome, sqlx::Error> {
    let deleted = sqlx::query(delete_sql)
        .bind(first)
        .bind(second)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    if deleted > 0 {
        return Ok(ToggleOutcome {
            active: false,
            created: false,
        });
    }

    let inserted = sqlx::query(insert_sql)
        .bind(first)
        .bind(second)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(ToggleOutcome {
        active: true,
        created: inserted > 0,
    })
}

async fn post_author(conn: &mut SqliteConnection, post_id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

pub async fn total_likes(pool: &SqlitePool, post_id: i64) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn followers_count(pool: &SqlitePool, user_id: i64) -> Result<i64, AppError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE following_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[derive(Debug, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub total_likes: i64,
}

/// Toggle Like on a post.
///
/// A newly applied like on someone else's post notifies the author, every
/// time it is applied.
pub async fn toggle_like(
    pool: &SqlitePool,
    user_id: i64,
    post_id: i64,
) -> Result<LikeState, AppError> {
    let mut tx = db::begin_write(pool).await?;

    let author_id = post_author(&mut tx, post_id).await?;

    let outcome = flip(
        &mut tx,
        "DELETE FROM post_likes WHERE user_id = ? AND post_id = ?",
        "INSERT INTO post_likes (user_id, post_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        user_id,
        post_id,
    )
    .await?;

    if outcome.created {
        notify(
            &mut tx,
            author_id,
            user_id,
            NotificationKind::Like,
            Some(post_id),
            None,
        )
        .await?;
    }

    tx.commit().await?;

    Ok(LikeState {
        liked: outcome.active,
        total_likes: total_likes(pool, post_id).await?,
    })
}

#[derive(Debug, Serialize)]
pub struct BookmarkState {
    pub bookmarked: bool,
}

/// Toggle Bookmark on a post. Bookmarks are private: no notification.
pub async fn toggle_bookmark(
    pool: &SqlitePool,
    user_id: i64,
    post_id: i64,
) -> Result<BookmarkState, AppError> {
    let mut tx = db::begin_write(pool).await?;

    post_author(&mut tx, post_id).await?;

    let outcome = flip(
        &mut tx,
        "DELETE FROM bookmarks WHERE user_id = ? AND post_id = ?",
        "INSERT INTO bookmarks (user_id, post_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        user_id,
        post_id,
    )
    .await?;

    tx.commit().await?;

    Ok(BookmarkState {
        bookmarked: outcome.active,
    })
}

#[derive(Debug, Serialize)]
pub struct FollowState {
    pub following: bool,
    pub followers_count: i64,
}

/// Toggle Follow on a user. Following yourself is refused.
pub async fn toggle_follow(
    pool: &SqlitePool,
    follower_id: i64,
    following_id: i64,
) -> Result<FollowState, AppError> {
    if follower_id == following_id {
        return Err(AppError::BadRequest("You cannot follow yourself.".to_string()));
    }

    let mut tx = db::begin_write(pool).await?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(following_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let outcome = flip(
        &mut tx,
        "DELETE FROM follows WHERE follower_id = ? AND following_id = ?",
        "INSERT INTO follows (follower_id, following_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        follower_id,
        following_id,
    )
    .await?;

    if outcome.created {
        notify(
            &mut tx,
            following_id,
            follower_id,
            NotificationKind::Follow,
            None,
            None,
        )
        .await?;
    }

    tx.commit().await?;

    Ok(FollowState {
        following: outcome.active,
        followers_count: followers_count(pool, following_id).await?,
    })
}

/// Whether `user_id` currently likes and bookmarks `post_id`.
pub async fn post_flags(
    pool: &SqlitePool,
    user_id: i64,
    post_id: i64,
) -> Result<(bool, bool), AppError> {
    let (liked, bookmarked) = sqlx::query_as::<_, (bool, bool)>(
        r#"
        SELECT
            EXISTS (SELECT 1 FROM post_likes WHERE user_id = ?1 AND post_id = ?2),
            EXISTS (SELECT 1 FROM bookmarks WHERE user_id = ?1 AND post_id = ?2)
        "#,
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_one(pool)
    .await?;
    Ok((liked, bookmarked))
}

pub async fn is_following(
    pool: &SqlitePool,
    follower_id: i64,
    following_id: i64,
) -> Result<bool, AppError> {
    let found = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = ? AND following_id = ?)",
    )
    .bind(follower_id)
    .bind(following_id)
    .fetch_one(pool)
    .await?;
    Ok(found)
}
